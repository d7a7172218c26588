//! Post records assembled from raw markdown sources.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::clock::{Clock, SystemClock};
use crate::date::to_iso;
use crate::metadata::{extract_metadata, DEFAULT_EXCERPT_PLACEHOLDER};
use crate::render::{Renderer, Theme};

/// A fully processed post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// File name without its `.md` extension
    pub slug: String,

    /// Display title
    pub title: String,

    /// Publication instant, serialized as `2024-03-15T00:00:00.000Z`
    #[serde(serialize_with = "serialize_iso")]
    pub published_at: DateTime<Utc>,

    /// Short preview text
    pub excerpt: String,

    /// Normalized markdown source
    pub content: String,

    /// Rendered HTML fragment, safe to embed as-is
    pub html: String,
}

impl Post {
    /// Publication date as `YYYY-MM-DD`.
    pub fn date_label(&self) -> String {
        self.published_at.format("%Y-%m-%d").to_string()
    }
}

fn serialize_iso<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso(instant))
}

/// Builds [`Post`]s from `(path, raw text)` pairs.
#[derive(Clone)]
pub struct PostBuilder {
    renderer: Renderer,
    clock: Arc<dyn Clock>,
    excerpt_placeholder: String,
}

impl PostBuilder {
    /// Builder with the default theme, the system clock and the default
    /// excerpt placeholder.
    pub fn new() -> Self {
        Self {
            renderer: Renderer::default(),
            clock: Arc::new(SystemClock),
            excerpt_placeholder: DEFAULT_EXCERPT_PLACEHOLDER.to_string(),
        }
    }

    /// Use `clock` for fallback titles and dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Render with `theme`.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.renderer = Renderer::new(theme);
        self
    }

    /// Excerpt used for posts without a body paragraph.
    pub fn with_excerpt_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.excerpt_placeholder = placeholder.into();
        self
    }

    /// Build a post from its source path and raw text.
    ///
    /// Only the last path segment is used as the file name.
    pub fn build(&self, path: &str, raw: &str) -> Post {
        let content = normalize(raw);
        let file_name = file_name(path);
        let meta = extract_metadata(
            file_name,
            &content,
            self.clock.as_ref(),
            &self.excerpt_placeholder,
        );
        let html = self.renderer.render(&content);

        tracing::debug!("Built post {} from {}", meta.slug, path);

        Post {
            slug: meta.slug,
            title: meta.title,
            published_at: meta.published_at,
            excerpt: meta.excerpt,
            content,
            html,
        }
    }

    /// Build a post from raw bytes. Content that is not valid UTF-8 is
    /// treated as empty.
    pub fn build_bytes(&self, path: &str, raw: &[u8]) -> Post {
        let text = std::str::from_utf8(raw).unwrap_or_else(|e| {
            tracing::warn!("{} is not valid UTF-8, treating as empty: {}", path, e);
            ""
        });
        self.build(path, text)
    }
}

impl Default for PostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize line endings to `\n` and trim surrounding whitespace.
pub fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim().to_string()
}

/// Last segment of a `/` or `\` separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or("")
}
