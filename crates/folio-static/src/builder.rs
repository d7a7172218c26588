//! Static site builder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use folio_md::{Clock, Library, Post, PostBuilder, Theme, DEFAULT_EXCERPT_PLACEHOLDER};

use crate::assets::AssetPipeline;
use crate::loader::{load_documents, LoadError};
use crate::templates::{post_url, Context, TemplateEngine};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source posts directory
    pub posts_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Minify CSS output
    pub minify: bool,

    /// Base URL for the site
    pub base_url: String,

    /// Site title
    pub title: String,

    /// Excerpt for posts without a body paragraph
    pub excerpt_placeholder: String,

    /// Classes applied to rendered markup
    pub theme: Theme,
}

impl BuildConfig {
    /// Post builder matching this configuration.
    pub fn post_builder(&self) -> PostBuilder {
        PostBuilder::new()
            .with_theme(self.theme.clone())
            .with_excerpt_placeholder(self.excerpt_placeholder.clone())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            output_dir: PathBuf::from("dist"),
            minify: true,
            base_url: "/".to_string(),
            title: "Blog".to_string(),
            excerpt_placeholder: DEFAULT_EXCERPT_PLACEHOLDER.to_string(),
            theme: Theme::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of post pages generated
    pub posts: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    posts: PostBuilder,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            posts: config.post_builder(),
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Use `clock` for posts that carry no date at all.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.posts = self.posts.with_clock(clock);
        self
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let sources = load_documents(&self.config.posts_dir)?;
        let library = Library::load(self.posts.clone(), &sources);
        let posts = library.posts();
        let pages = unique_pages(&library, &posts);

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        self.write_index(&posts)?;

        // Render post pages in parallel
        let results: Vec<Result<usize, BuildError>> =
            pages.par_iter().map(|post| self.build_post(post)).collect();

        let mut written = 0;
        for result in results {
            written += result?;
        }

        self.write_feed(&posts)?;
        self.generate_assets()?;
        self.generate_sitemap(&pages)?;

        Ok(BuildResult {
            posts: written,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Write the post listing page.
    fn write_index(&self, posts: &[Post]) -> Result<(), BuildError> {
        let context = Context::index(&self.config.title, &self.config.base_url, posts);
        let html = self
            .templates
            .render_page("index.html", &context)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        write(&self.config.output_dir.join("index.html"), html)
    }

    /// Build a single post page. Returns the number of pages written.
    fn build_post(&self, post: &Post) -> Result<usize, BuildError> {
        if post.slug.is_empty() {
            tracing::warn!("Skipping post \"{}\" with an empty slug", post.title);
            return Ok(0);
        }

        let context = Context::post(&self.config.title, &self.config.base_url, post);
        let html = self
            .templates
            .render_page("post.html", &context)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let path = self
            .config
            .output_dir
            .join("posts")
            .join(&post.slug)
            .join("index.html");
        write(&path, html)?;

        tracing::debug!("Wrote {}", path.display());

        Ok(1)
    }

    /// Write the ordered post records as JSON.
    fn write_feed(&self, posts: &[Post]) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(posts)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write(&self.config.output_dir.join("posts.json"), json)
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let css = AssetPipeline::stylesheet(self.config.minify);
        write(&self.config.output_dir.join("assets").join("main.css"), css)
    }

    /// Generate sitemap and robots.txt.
    fn generate_sitemap(&self, pages: &[&Post]) -> Result<(), BuildError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut urls = vec![format!(
            "  <url>\n    <loc>{}/</loc>\n  </url>",
            base
        )];

        urls.extend(pages.iter().filter(|p| !p.slug.is_empty()).map(|post| {
            format!(
                "  <url>\n    <loc>{}{}</loc>\n    <lastmod>{}</lastmod>\n  </url>",
                base,
                post_url("/", &post.slug),
                post.date_label()
            )
        }));

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>"#,
            urls.join("\n")
        );

        write(&self.config.output_dir.join("sitemap.xml"), sitemap)?;

        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}sitemap.xml",
            self.config.base_url
        );
        write(&self.config.output_dir.join("robots.txt"), robots)
    }
}

/// One post per slug, in listing order.
///
/// Posts sharing a slug resolve to the one the library returns for that
/// slug, so a static build serves the same page as a lookup does.
fn unique_pages<'a>(library: &Library, posts: &'a [Post]) -> Vec<&'a Post> {
    let mut seen = HashSet::new();
    let mut pages = Vec::new();
    for post in posts {
        if library.get(&post.slug) == Some(post) && seen.insert(post.slug.as_str()) {
            pages.push(post);
        }
    }
    pages
}

/// Write `contents` to `path`, creating parent directories.
fn write(path: &Path, contents: String) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }
    fs::write(path, contents)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use folio_md::FixedClock;
    use tempfile::tempdir;

    fn builder(posts_dir: PathBuf, output_dir: PathBuf) -> StaticBuilder {
        StaticBuilder::new(BuildConfig {
            posts_dir,
            output_dir,
            ..Default::default()
        })
        .with_clock(FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn builds_simple_site() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        let out = temp.path().join("dist");

        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("2024-03-15-hello-world.md"),
            "# Hello\n\nFirst post with **bold** text.",
        )
        .unwrap();

        let result = builder(posts, out.clone()).build().await.unwrap();

        assert_eq!(result.posts, 1);
        assert!(out.join("index.html").exists());
        assert!(out.join("assets").join("main.css").exists());
        assert!(out.join("robots.txt").exists());

        let page =
            fs::read_to_string(out.join("posts").join("2024-03-15-hello-world").join("index.html"))
                .unwrap();
        assert!(page.contains("<strong"));
        assert!(page.contains("First post with"));
    }

    #[tokio::test]
    async fn writes_posts_newest_first() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        let out = temp.path().join("dist");

        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("a.md"), "# A\ndate: 2023-01-01\n\nA").unwrap();
        fs::write(posts.join("b.md"), "# B\ndate: 2024-06-01\n\nB").unwrap();
        fs::write(posts.join("c.md"), "# C\ndate: 2022-12-31\n\nC").unwrap();

        builder(posts, out.clone()).build().await.unwrap();

        let json = fs::read_to_string(out.join("posts.json")).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        let dates: Vec<_> = records
            .iter()
            .map(|r| r["publishedAt"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(
            dates,
            vec![
                "2024-06-01T00:00:00.000Z",
                "2023-01-01T00:00:00.000Z",
                "2022-12-31T00:00:00.000Z",
            ]
        );
    }

    #[tokio::test]
    async fn sitemap_lists_every_post() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        let out = temp.path().join("dist");

        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("2024-01-02-one.md"), "One").unwrap();
        fs::write(posts.join("2024-01-03-two.md"), "Two").unwrap();

        builder(posts, out.clone()).build().await.unwrap();

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>/posts/2024-01-02-one/</loc>"));
        assert!(sitemap.contains("<lastmod>2024-01-03</lastmod>"));
    }

    #[tokio::test]
    async fn shared_slug_writes_the_looked_up_post_once() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        let out = temp.path().join("dist");

        fs::create_dir_all(posts.join("a")).unwrap();
        fs::create_dir_all(posts.join("b")).unwrap();
        fs::write(posts.join("a").join("same.md"), "# First\ndate: 2023-01-01").unwrap();
        fs::write(posts.join("b").join("same.md"), "# Second\ndate: 2024-01-01").unwrap();

        let result = builder(posts.clone(), out.clone()).build().await.unwrap();

        let sources = load_documents(&posts).unwrap();
        let library = Library::load(PostBuilder::new(), &sources);
        assert_eq!(library.get("same").unwrap().title, "Second");

        assert_eq!(result.posts, 1);
        let page =
            fs::read_to_string(out.join("posts").join("same").join("index.html")).unwrap();
        assert!(page.contains("<title>Second - Blog</title>"));
        assert!(!page.contains("First"));

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert_eq!(sitemap.matches("<loc>/posts/same/</loc>").count(), 1);
    }

    #[tokio::test]
    async fn shared_slug_resolves_by_load_order_not_date() {
        let temp = tempdir().unwrap();
        let posts = temp.path().join("posts");
        let out = temp.path().join("dist");

        fs::create_dir_all(posts.join("a")).unwrap();
        fs::create_dir_all(posts.join("b")).unwrap();
        fs::write(posts.join("a").join("same.md"), "# Newer\ndate: 2024-01-01").unwrap();
        fs::write(posts.join("b").join("same.md"), "# Older\ndate: 2023-01-01").unwrap();

        builder(posts, out.clone()).build().await.unwrap();

        let page =
            fs::read_to_string(out.join("posts").join("same").join("index.html")).unwrap();
        assert!(page.contains("<title>Older - Blog</title>"));
        assert!(!page.contains("Newer"));
    }

    #[tokio::test]
    async fn fails_without_posts_directory() {
        let temp = tempdir().unwrap();

        let result = builder(temp.path().join("missing"), temp.path().join("dist"))
            .build()
            .await;

        assert!(matches!(result, Err(BuildError::Load(LoadError::MissingDir(_)))));
    }
}
