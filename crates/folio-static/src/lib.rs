//! Static site generator for folio blogs.
//!
//! Loads markdown posts from disk and builds a static blog: a post listing,
//! one page per post, a JSON feed of the ordered records and a sitemap.

pub mod assets;
pub mod builder;
pub mod loader;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use loader::{load_documents, LoadError};
pub use templates::{Context, TemplateEngine};
