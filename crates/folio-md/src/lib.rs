//! Markdown blog posts to render-ready records.
//!
//! This crate infers post metadata (slug, title, publish date, excerpt) from
//! file names and markdown bodies, renders markdown to styled HTML, and
//! exposes the processed posts as an immutable, newest-first collection.

pub mod clock;
pub mod codeblock;
pub mod collection;
pub mod date;
pub mod html;
pub mod metadata;
pub mod post;
pub mod render;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collection::{sort_newest_first, Library, PostSet, Sources};
pub use metadata::{extract_metadata, Metadata, DEFAULT_EXCERPT_PLACEHOLDER};
pub use post::{Post, PostBuilder};
pub use render::{render_markdown, Renderer, Theme};
