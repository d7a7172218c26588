//! Posts directory watching for live reload.
//!
//! notify delivers events on its own thread. They are classified, debounced
//! per path and handed to the async side over a tokio channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events closer together than this for the same path are dropped.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// A change below the posts directory.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Markdown post was modified
    PostModified(PathBuf),

    /// File was created or moved in
    Created(PathBuf),

    /// File was deleted or moved away
    Deleted(PathBuf),

    /// Anything else changed
    Modified(PathBuf),
}

impl WatchEvent {
    /// Classify a notify event kind for `path`.
    ///
    /// Access events and notify's catch-all kinds carry no change.
    pub fn classify(path: &Path, kind: &EventKind) -> Option<Self> {
        let path = path.to_path_buf();
        match kind {
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                Some(Self::Deleted(path))
            }
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => {
                Some(Self::Created(path))
            }
            EventKind::Modify(_) if folio_static::loader::is_markdown(&path) => {
                Some(Self::PostModified(path))
            }
            EventKind::Modify(_) => Some(Self::Modified(path)),
            _ => None,
        }
    }

    /// Path the event refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::PostModified(p) | Self::Created(p) | Self::Deleted(p) | Self::Modified(p) => p,
        }
    }
}

/// Drops repeats of an event for the same path inside the debounce window.
#[derive(Debug, Default)]
struct Debouncer {
    last_seen: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    /// Whether `event`, seen at `now`, should be forwarded.
    fn admit(&mut self, event: &WatchEvent, now: Instant) -> bool {
        match self.last_seen.get(event.path()) {
            Some(&last) if now.duration_since(last) < DEBOUNCE => false,
            _ => {
                self.last_seen.insert(event.path().to_path_buf(), now);
                true
            }
        }
    }
}

/// Watches the posts directory.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `dir` recursively.
    ///
    /// Returns the watcher, which must be kept alive, and the event channel.
    pub fn new(dir: &Path) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            match res {
                Ok(event) => {
                    let _ = sync_tx.send(event);
                }
                Err(e) => tracing::warn!("Watch error: {}", e),
            }
        })
        .map_err(std::io::Error::other)?;

        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(std::io::Error::other)?;

        tracing::debug!("Watching {}", dir.display());

        std::thread::spawn(move || forward(sync_rx, async_tx));

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Pump notify events into the async channel until either side closes.
fn forward(rx: mpsc::Receiver<notify::Event>, tx: async_mpsc::Sender<WatchEvent>) {
    let mut debouncer = Debouncer::default();

    while let Ok(event) = rx.recv() {
        let now = Instant::now();
        for path in &event.paths {
            let Some(change) = WatchEvent::classify(path, &event.kind) else {
                continue;
            };
            if debouncer.admit(&change, now) && tx.blocking_send(change).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, RemoveKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_events() {
        let post = Path::new("posts/hello.md");
        let other = Path::new("posts/image.png");

        assert_eq!(
            WatchEvent::classify(post, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::PostModified(post.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(other, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::Modified(other.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(post, &EventKind::Create(CreateKind::File)),
            Some(WatchEvent::Created(post.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(post, &EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(WatchEvent::Created(post.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(post, &EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(WatchEvent::Deleted(post.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(post, &EventKind::Remove(RemoveKind::File)),
            Some(WatchEvent::Deleted(post.to_path_buf()))
        );
        assert_eq!(
            WatchEvent::classify(post, &EventKind::Access(AccessKind::Any)),
            None
        );
    }

    #[test]
    fn debounces_per_path() {
        let mut debouncer = Debouncer::default();
        let start = Instant::now();
        let a = WatchEvent::PostModified(PathBuf::from("a.md"));
        let b = WatchEvent::Deleted(PathBuf::from("b.md"));

        assert!(debouncer.admit(&a, start));
        assert!(!debouncer.admit(&a, start + Duration::from_millis(10)));
        assert!(debouncer.admit(&b, start + Duration::from_millis(10)));
        assert!(debouncer.admit(&a, start + DEBOUNCE * 2));
    }

    #[test]
    fn fails_on_missing_directory() {
        let temp = tempdir().unwrap();
        assert!(FileWatcher::new(&temp.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn reports_new_posts() {
        let temp = tempdir().unwrap();
        let post = temp.path().join("new-post.md");

        let (watcher, mut rx) = FileWatcher::new(temp.path()).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&post, "# Created").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        drop(watcher);

        let event = event
            .expect("timeout waiting for file watch event")
            .expect("channel should not be closed");
        assert_eq!(event.path().file_name(), post.file_name());
    }
}
