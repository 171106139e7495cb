//! The configuration store: lock-free typed reads, watcher-driven reloads.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::Snapshot;
use crate::error::Result;
use crate::notify::{ChangeWatcher, SubscriberRegistry, SubscriptionHandle, WatchEvent};

/// A hot-reloading key/value configuration store bound to one file.
///
/// The store keeps the current [`Snapshot`] behind an atomic pointer
/// (`arc-swap`), so reads never take a lock and never observe a
/// partially-updated mapping. A background task, the sole writer, re-reads
/// and re-decodes the file whenever it changes on disk, swapping in a new
/// snapshot only when the decode succeeds. A malformed rewrite, or deleting
/// the file outright, leaves the last good values in place indefinitely.
///
/// # Examples
///
/// ```rust,no_run
/// use liveconf::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let store = ConfigStore::new("service.yaml").await?;
///
/// let host = store.get_string("host", "127.0.0.1");
/// let port = store.get_int("port", 8080);
/// let debug = store.get_bool("debug", false);
/// # Ok(())
/// # }
/// ```
pub struct ConfigStore {
    /// Source file; immutable after construction.
    path: PathBuf,
    /// The current snapshot, swapped atomically by the reload path.
    current: Arc<ArcSwap<Snapshot>>,
    /// Callbacks to run after each successful swap.
    subscribers: Arc<SubscriberRegistry>,
    /// Background reload loop; owns the watch handle.
    reload_task: JoinHandle<()>,
}

impl ConfigStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is read and decoded once up front (YAML first, then JSON)
    /// and the result becomes the initial snapshot. A filesystem watch is
    /// then attached to the same path and a background task takes over all
    /// subsequent reloads; getters never trigger IO.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if both decoders reject
    /// its contents (the [`DecodeError`](crate::error::DecodeError) carries
    /// both rejections), or if the path cannot be watched. No store is
    /// returned in any of these cases.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let initial = Snapshot::load(&path).await?;
        info!(path = %path.display(), values = initial.len(), "configuration loaded");

        let (watcher, events) = ChangeWatcher::new(&path)?;

        let current = Arc::new(ArcSwap::from_pointee(initial));
        let subscribers = Arc::new(SubscriberRegistry::new());
        let reload_task = spawn_reload_loop(
            path.clone(),
            watcher,
            Arc::clone(&current),
            Arc::clone(&subscribers),
            events,
        );

        Ok(Self {
            path,
            current,
            subscribers,
            reload_task,
        })
    }

    /// Get the string value for `key`, or `default` if the key is absent.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.current.load().get(key) {
            Some(value) => value.to_owned(),
            None => default.to_owned(),
        }
    }

    /// Get the value for `key` parsed as a base-10 signed integer.
    ///
    /// A key that is absent, or present but not parseable as an integer,
    /// resolves to `default`. The two cases are deliberately
    /// indistinguishable; coercion misses are part of the contract, not
    /// errors.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.current
            .load()
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    /// Get the value for `key` parsed as a boolean.
    ///
    /// Accepts the literals `"true"` and `"false"`. Native YAML/JSON
    /// booleans are coerced to exactly those strings at decode time, so they
    /// always round-trip. Anything else, including an absent key, resolves
    /// to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.current
            .load()
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    /// Raw lookup without coercion or defaulting.
    pub fn get(&self, key: &str) -> Option<String> {
        self.current.load().get(key).map(str::to_owned)
    }

    /// Cheap reference-counted handle to the whole current snapshot.
    ///
    /// The handle stays internally consistent even as later reloads publish
    /// new snapshots; use it when several lookups must agree with each
    /// other.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Number of keys in the current snapshot.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Whether the current snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// The file this store was constructed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read and republish the configuration immediately.
    ///
    /// Same pipeline as the watcher-driven path, but failures are returned
    /// to the caller instead of absorbed. The current snapshot is untouched
    /// unless the decode succeeds.
    pub async fn reload(&self) -> Result<()> {
        let next = Snapshot::load(&self.path).await?;
        publish(&self.current, &self.subscribers, next);
        Ok(())
    }

    /// Register a callback invoked after every successful reload.
    ///
    /// Dropping the returned handle unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Stop watching the file.
    ///
    /// The reload task is aborted and the filesystem watch released; getters
    /// keep serving the last published snapshot. Dropping the store has the
    /// same effect.
    pub fn close(&self) {
        self.reload_task.abort();
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        self.reload_task.abort();
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("values", &self.current.load().len())
            .finish_non_exhaustive()
    }
}

/// Swap in a freshly decoded snapshot and tell subscribers.
fn publish(current: &ArcSwap<Snapshot>, subscribers: &SubscriberRegistry, next: Snapshot) {
    let values = next.len();
    current.store(Arc::new(next));
    info!(values, "configuration reloaded");
    subscribers.notify_all();
}

/// The sole writer of the snapshot: one task per store, driven by the
/// serialized watcher event stream. Owns the watch handle so that aborting
/// the task also releases the OS watch.
fn spawn_reload_loop(
    path: PathBuf,
    watcher: ChangeWatcher,
    current: Arc<ArcSwap<Snapshot>>,
    subscribers: Arc<SubscriberRegistry>,
    mut events: mpsc::UnboundedReceiver<WatchEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _watcher = watcher;

        while let Some(event) = events.recv().await {
            match event {
                WatchEvent::Written => match Snapshot::load(&path).await {
                    Ok(next) => publish(&current, &subscribers, next),
                    // Covers malformed rewrites, truncated mid-save reads
                    // and a deleted source file alike: the last good
                    // snapshot keeps serving.
                    Err(err) => {
                        warn!(error = %err, "reload failed, keeping current configuration");
                    }
                },
                WatchEvent::Failed(err) => {
                    warn!(error = %err, "watch backend reported an error");
                }
            }
        }
    })
}
