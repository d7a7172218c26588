//! List posts in publication order.

use std::path::Path;

use anyhow::Result;
use folio_md::{date::to_iso, Library, Post};
use folio_static::load_documents;

use crate::config::load_config;

/// Run the list command.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?.build_config(None);

    let sources = load_documents(&config.posts_dir)?;
    let library = Library::load(config.post_builder(), &sources);
    let posts = library.posts();

    if posts.is_empty() {
        tracing::info!("No posts in {}", config.posts_dir.display());
        return Ok(());
    }

    for post in posts.iter() {
        println!("{}", line(post));
    }

    Ok(())
}

fn line(post: &Post) -> String {
    format!("{}  {}  {}", to_iso(&post.published_at), post.slug, post.title)
}
