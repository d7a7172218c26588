//! Initialize a blog in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    let today = Utc::now().format("%Y-%m-%d").to_string();
    scaffold(config_path, yes, &today)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'folio dev' to start the development server.");

    Ok(())
}

/// Write the config file and a posts directory holding one sample post
/// dated `today`, next to the config file. Existing files are only
/// replaced when `yes` is set.
fn scaffold(config_path: &Path, yes: bool, today: &str) -> Result<()> {
    let root = config_path.parent().unwrap_or_else(|| Path::new("."));
    let posts_dir = root.join("posts");

    if posts_dir.exists() {
        if !yes {
            tracing::warn!("posts/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&posts_dir).context("Failed to create posts directory")?;
    }

    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    }

    let post_path = posts_dir.join(format!("{}-hello-world.md", today));
    if !post_path.exists() || yes {
        fs::write(&post_path, sample_post(today))
            .with_context(|| format!("Failed to write {}", post_path.display()))?;
        tracing::info!("Created {}", post_path.display());
    }

    Ok(())
}

fn sample_post(today: &str) -> String {
    DEFAULT_POST.replace("{date}", today)
}

const DEFAULT_CONFIG: &str = r#"# folio configuration

[site]
# Site title
title = "My Blog"

# Base URL (for deployment)
base_url = "/"

[posts]
# Directory holding markdown posts
dir = "posts"

# Excerpt shown for posts without a body paragraph
excerpt_placeholder = "敬请期待更多内容。"

[build]
# Output directory for built site
output = "dist"

# Enable minification
minify = true

# [theme]
# Override the CSS classes of any rendered element:
# h1, h2, h3, link, strong, em, code, pre, blockquote,
# ul, ul_item, ol, ol_item, paragraph
"#;

const DEFAULT_POST: &str = r#"# Hello World
date: {date}

This is your first post. Edit or delete it, then add more markdown files to `posts/`.

## Writing posts

The first `# heading` is the title and a `date:` line sets the publication date.
Without one, a date in the file name such as `2024-03-15-my-post.md` is used.

- **Bold** and *italic* text
- [Links](https://example.com) and `inline code`

> Quotes work too.

```
fn main() {
    println!("Fenced code is kept as written");
}
```
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_config_and_sample_post() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("folio.toml");

        scaffold(&config_path, false, "2025-02-03").unwrap();

        let config = fs::read_to_string(&config_path).unwrap();
        assert!(config.contains("[site]"));

        let post =
            fs::read_to_string(temp.path().join("posts").join("2025-02-03-hello-world.md"))
                .unwrap();
        assert!(post.starts_with("# Hello World\ndate: 2025-02-03\n"));
    }

    #[test]
    fn scaffolded_config_parses() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("folio.toml");

        scaffold(&config_path, false, "2025-02-03").unwrap();

        let config = crate::config::load_config(&config_path).unwrap();
        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.posts.dir, "posts");
    }

    #[test]
    fn config_in_subdirectory_finds_its_sample_post() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("site").join("folio.toml");

        scaffold(&config_path, false, "2025-02-03").unwrap();

        let config = crate::config::load_config(&config_path).unwrap();
        let sources = folio_static::load_documents(&config.posts_dir()).unwrap();
        assert_eq!(
            sources.keys().collect::<Vec<_>>(),
            vec!["2025-02-03-hello-world.md"]
        );
    }

    #[test]
    fn keeps_existing_posts_without_yes() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("folio.toml");
        fs::create_dir_all(temp.path().join("posts")).unwrap();

        scaffold(&config_path, false, "2025-02-03").unwrap();

        assert!(!config_path.exists());
    }

    #[test]
    fn overwrites_with_yes() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("folio.toml");
        fs::create_dir_all(temp.path().join("posts")).unwrap();
        fs::write(&config_path, "old").unwrap();

        scaffold(&config_path, true, "2025-02-03").unwrap();

        assert!(fs::read_to_string(&config_path).unwrap().contains("[build]"));
        assert!(temp
            .path()
            .join("posts")
            .join("2025-02-03-hello-world.md")
            .exists());
    }
}
