//! File watching bound to a single configuration path.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;

use crate::error::Result;

/// A change notification for the watched file.
#[derive(Debug)]
pub enum WatchEvent {
    /// The watched file received a write (or was recreated in place).
    Written,
    /// The notification backend reported an internal failure. The watch
    /// itself keeps running.
    Failed(notify::Error),
}

/// Watches one configuration file and forwards its change events.
///
/// Events are delivered over an unbounded channel, consumed by the store's
/// reload loop. The watcher never reads or interprets file content, and it
/// does not coalesce bursts of writes; reloading redundantly is cheap and
/// idempotent. Dropping the watcher releases the OS watch.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ChangeWatcher {
    /// Start watching `path`.
    ///
    /// The path is canonicalized before registration so relative and
    /// symlinked paths watch the real file.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher backend cannot be created or the
    /// path cannot be watched (e.g. it does not exist).
    pub fn new(path: &Path) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
        let canonical = path.canonicalize().map_err(notify::Error::io)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    // Create covers editors that save by replacing the file.
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        let _ = tx.send(WatchEvent::Written);
                    }
                }
                Err(err) => {
                    let _ = tx.send(WatchEvent::Failed(err));
                }
            }
        })?;
        watcher.watch(&canonical, RecursiveMode::NonRecursive)?;

        Ok((
            Self {
                _watcher: watcher,
                path: canonical,
            },
            rx,
        ))
    }

    /// The canonicalized path under watch.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
