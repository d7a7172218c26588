//! Development server with live reload for folio blogs.
//!
//! Serves the post collection straight from the posts directory and reloads
//! it, and every connected browser, whenever a file changes.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{LiveMessage, ReloadHub};
