//! Loading post sources from disk.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use folio_md::Sources;

/// Errors that can occur while loading posts.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Posts directory not found: {0}")]
    MissingDir(PathBuf),

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
}

/// Read every `.md` file under `dir`.
///
/// Keys are paths relative to `dir` with `/` separators. Files that are not
/// valid UTF-8 are loaded as empty text.
pub fn load_documents(dir: &Path) -> Result<Sources, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDir(dir.to_path_buf()));
    }

    let mut sources = Sources::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_markdown(path) {
            continue;
        }

        let bytes = fs::read(path).map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let text = String::from_utf8(bytes).unwrap_or_else(|_| {
            tracing::warn!("{} is not valid UTF-8, loading it as empty", path.display());
            String::new()
        });

        sources.insert(source_key(dir, path), text);
    }

    tracing::debug!("Loaded {} sources from {}", sources.len(), dir.display());

    Ok(sources)
}

/// Whether `path` has an `.md` extension, ignoring case.
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn source_key(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
