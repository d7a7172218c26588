//! Configuration file (folio.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use folio_md::{Theme, DEFAULT_EXCERPT_PLACEHOLDER};
use folio_server::DevServerConfig;
use folio_static::BuildConfig;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub posts: PostsConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub theme: Theme,

    /// Directory of the config file; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PostsConfig {
    #[serde(default = "default_posts_dir")]
    pub dir: String,
    #[serde(default = "default_excerpt_placeholder")]
    pub excerpt_placeholder: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_minify")]
    pub minify: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_url: default_base_url(),
        }
    }
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            dir: default_posts_dir(),
            excerpt_placeholder: default_excerpt_placeholder(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            minify: default_minify(),
        }
    }
}

fn default_title() -> String {
    "Blog".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_posts_dir() -> String {
    "posts".to_string()
}
fn default_excerpt_placeholder() -> String {
    DEFAULT_EXCERPT_PLACEHOLDER.to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_minify() -> bool {
    true
}

impl ConfigFile {
    /// Static build settings, with an optional output override.
    pub fn build_config(&self, output: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            posts_dir: self.posts_dir(),
            output_dir: output.unwrap_or_else(|| self.root.join(&self.build.output)),
            minify: self.build.minify,
            base_url: normalize_base_url(&self.site.base_url),
            title: self.site.title.clone(),
            excerpt_placeholder: self.posts.excerpt_placeholder.clone(),
            theme: self.theme.clone(),
        }
    }

    /// Posts directory, relative to the config file.
    pub fn posts_dir(&self) -> PathBuf {
        self.root.join(&self.posts.dir)
    }

    /// Dev server settings.
    pub fn dev_config(&self, port: u16, open: bool) -> DevServerConfig {
        DevServerConfig {
            posts_dir: self.posts_dir(),
            port,
            open,
            title: self.site.title.clone(),
            excerpt_placeholder: self.posts.excerpt_placeholder.clone(),
            theme: self.theme.clone(),
            ..Default::default()
        }
    }
}

/// Base URLs always end with a slash so page links can be appended.
fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
///
/// Relative paths in the file resolve against the file's directory, also
/// when the file is missing.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile {
            root,
            ..Default::default()
        });
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.root = root;

    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join("folio.toml")).unwrap();

        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.posts.dir, "posts");
        assert_eq!(config.posts.excerpt_placeholder, DEFAULT_EXCERPT_PLACEHOLDER);
        assert_eq!(config.build.output, "dist");
        assert!(config.build.minify);
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn reads_sections_and_theme_overrides() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Notes"
base_url = "/blog"

[posts]
dir = "content"

[build]
minify = false

[theme]
h1 = "title"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let build = config.build_config(None);

        assert_eq!(build.title, "Notes");
        assert_eq!(build.base_url, "/blog/");
        assert_eq!(build.posts_dir, temp.path().join("content"));
        assert_eq!(build.output_dir, temp.path().join("dist"));
        assert!(!build.minify);
        assert_eq!(build.theme.h1, "title");
        assert_eq!(build.theme.h2, Theme::default().h2);
    }

    #[test]
    fn paths_resolve_against_config_directory() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("folio.toml"), "[posts]\ndir = \"entries\"\n").unwrap();

        let config = load_config(&site.join("folio.toml")).unwrap();

        assert_eq!(config.build_config(None).posts_dir, site.join("entries"));
        assert_eq!(config.build_config(None).output_dir, site.join("dist"));
        assert_eq!(config.dev_config(7777, false).posts_dir, site.join("entries"));
    }

    #[test]
    fn bare_file_name_resolves_against_working_directory() {
        let config = load_config(Path::new("folio-missing-config.toml")).unwrap();

        assert_eq!(config.posts_dir(), PathBuf::from("posts"));
    }

    #[test]
    fn output_override_wins() {
        let config = ConfigFile::default();
        let build = config.build_config(Some(PathBuf::from("public")));

        assert_eq!(build.output_dir, PathBuf::from("public"));
    }

    #[test]
    fn dev_config_uses_posts_dir() {
        let config = ConfigFile::default();
        let dev = config.dev_config(8080, false);

        assert_eq!(dev.port, 8080);
        assert!(!dev.open);
        assert_eq!(dev.posts_dir, PathBuf::from("posts"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("folio.toml");
        fs::write(&path, "[site\ntitle = ").unwrap();

        assert!(load_config(&path).is_err());
    }
}
