//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use tokio::sync::{broadcast::error::RecvError, RwLock};

use folio_md::{html::escape_html, Library, Post, PostBuilder, Theme, DEFAULT_EXCERPT_PLACEHOLDER};
use folio_static::assets::AssetPipeline;
use folio_static::{load_documents, Context, LoadError, TemplateEngine};

use crate::watcher::{FileWatcher, WatchEvent};
use crate::websocket::{live_reload_script, LiveMessage, ReloadHub};

const LIVE_RELOAD_PATH: &str = "/__livereload";
const LIVE_RELOAD_SCRIPT_PATH: &str = "/__livereload.js";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory containing posts
    pub posts_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Site title
    pub title: String,

    /// Excerpt for posts without a body paragraph
    pub excerpt_placeholder: String,

    /// Classes applied to rendered markup
    pub theme: Theme,
}

impl DevServerConfig {
    fn post_builder(&self) -> PostBuilder {
        PostBuilder::new()
            .with_theme(self.theme.clone())
            .with_excerpt_placeholder(self.excerpt_placeholder.clone())
    }
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
            title: "Blog".to_string(),
            excerpt_placeholder: DEFAULT_EXCERPT_PLACEHOLDER.to_string(),
            theme: Theme::default(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    library: Library,
    hub: ReloadHub,
    templates: TemplateEngine,
}

type SharedState = Arc<RwLock<ServerState>>;

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address.clone()))?;

        let state = initial_state(self.config.clone())?;

        // Set up file watcher
        let (watcher, mut rx) = FileWatcher::new(&self.config.posts_dir)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        // Spawn file watch handler
        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_watch_event(&state_clone, event).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::debug!("Could not open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Load the posts directory and set up shared state.
fn initial_state(config: DevServerConfig) -> Result<SharedState, ServerError> {
    let sources = load_documents(&config.posts_dir)?;
    let library = Library::load(config.post_builder(), &sources);

    Ok(Arc::new(RwLock::new(ServerState {
        config,
        library,
        hub: ReloadHub::new(),
        templates: TemplateEngine::new(),
    })))
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/posts/{slug}", get(post_handler))
        .route("/posts/{slug}/", get(post_handler))
        .route("/posts.json", get(feed_handler))
        .route("/assets/main.css", get(css_handler))
        .route(LIVE_RELOAD_PATH, get(ws_handler))
        .route(LIVE_RELOAD_SCRIPT_PATH, get(live_reload_script_handler))
        .with_state(state)
}

/// Handle file watch events.
async fn handle_watch_event(state: &SharedState, event: WatchEvent) {
    let path = event.path().display();
    match &event {
        WatchEvent::PostModified(_) => tracing::info!("Post modified: {}", path),
        WatchEvent::Created(_) => tracing::info!("Created: {}", path),
        WatchEvent::Deleted(_) => tracing::info!("Deleted: {}", path),
        WatchEvent::Modified(_) => tracing::debug!("Modified: {}", path),
    }

    if let Err(e) = reload_posts(state).await {
        tracing::warn!("Keeping previous posts: {}", e);
    }
}

/// Rebuild the library from disk, swap it in and notify browsers.
///
/// Returns the new load generation. Requests keep seeing the previous
/// collection until the swap.
async fn reload_posts(state: &SharedState) -> Result<u64, ServerError> {
    let (posts_dir, mut library) = {
        let state = state.read().await;
        (state.config.posts_dir.clone(), state.library.clone())
    };

    let sources = load_documents(&posts_dir)?;
    library.reload(&sources);
    let generation = library.generation();

    let mut state = state.write().await;
    state.library = library;
    state.hub.send(LiveMessage::Reload { generation });

    Ok(generation)
}

/// Render a page with the live reload client attached.
fn render_page(
    state: &ServerState,
    status: StatusCode,
    template: &str,
    context: Context,
) -> (StatusCode, Html<String>) {
    let context = context.with_live_reload(LIVE_RELOAD_SCRIPT_PATH);

    match state.templates.render_page(template, &context) {
        Ok(html) => (status, Html(html)),
        Err(e) => {
            tracing::error!("Failed to render {}: {}", template, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("<p>Template error: {}</p>", escape_html(&e.to_string()))),
            )
        }
    }
}

/// Handler for the post listing.
async fn index_handler(State(state): State<SharedState>) -> (StatusCode, Html<String>) {
    let state = state.read().await;
    let posts = state.library.posts();
    let context = Context::index(&state.config.title, "/", &posts);

    render_page(&state, StatusCode::OK, "index.html", context)
}

/// Handler for a single post page.
async fn post_handler(
    Path(slug): Path<String>,
    State(state): State<SharedState>,
) -> (StatusCode, Html<String>) {
    let state = state.read().await;

    match state.library.get(&slug) {
        Some(post) => {
            let context = Context::post(&state.config.title, "/", post);
            render_page(&state, StatusCode::OK, "post.html", context)
        }
        None => {
            tracing::debug!("No post with slug {}", slug);
            let context = Context::not_found(&state.config.title, "/");
            render_page(&state, StatusCode::NOT_FOUND, "404.html", context)
        }
    }
}

/// Handler for the ordered post records.
async fn feed_handler(State(state): State<SharedState>) -> Json<Vec<Post>> {
    let state = state.read().await;
    Json(state.library.posts().to_vec())
}

/// Handler for the stylesheet.
async fn css_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        AssetPipeline::stylesheet(false),
    )
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: SharedState) {
    let mut rx = {
        let state = state.read().await;
        state.hub.subscribe()
    };

    if !send_message(&mut socket, &LiveMessage::Connected).await {
        return;
    }

    // Forward reload messages to the client
    loop {
        match rx.recv().await {
            Ok(msg) => {
                if !send_message(&mut socket, &msg).await {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Live reload client skipped {} messages", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Send `msg` as JSON. Returns false once the client is gone.
async fn send_message(socket: &mut WebSocket, msg: &LiveMessage) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return false;
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handler for the live reload client script.
async fn live_reload_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        live_reload_script(LIVE_RELOAD_PATH),
    )
}
