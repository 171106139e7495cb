//! # liveconf
//!
//! A hot-reloading, flat key/value configuration store.
//!
//! ## Overview
//!
//! `liveconf` loads string-keyed settings from a single file, serves them
//! through typed getters with caller-supplied defaults, and republishes its
//! in-memory snapshot whenever the file changes on disk. Reads are
//! lock-free (`arc-swap`): a reload never blocks readers for longer than
//! one atomic pointer swap, and a reader never observes a partially-updated
//! mapping.
//!
//! The file may be YAML or JSON. YAML is decoded first and JSON is the
//! fallback; when both decoders reject the document, the error carries both
//! rejections. Either way the document must be a flat mapping from string
//! keys to scalars; numbers and booleans are coerced to their textual form
//! when the snapshot is built.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use liveconf::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let store = ConfigStore::new("service.yaml").await?;
//!
//! // Lock-free reads with default fallback
//! let host = store.get_string("host", "127.0.0.1");
//! let port = store.get_int("port", 8080);
//! let debug = store.get_bool("debug", false);
//! # Ok(())
//! # }
//! ```
//!
//! ## Degradation contract
//!
//! The store never loses the last good configuration:
//!
//! - a malformed rewrite of the file is logged and ignored; getters keep
//!   serving the previous values
//! - deleting the file leaves the last snapshot in place indefinitely
//! - a value that cannot be coerced to the requested type resolves to the
//!   caller's default, exactly as if the key were absent
//!
//! Only construction (and the manual [`ConfigStore::reload`]) can fail:
//! unreadable file, a document rejected by both decoders, or an unwatchable
//! path.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigStore, Snapshot};
    pub use crate::error::{ConfigError, DecodeError, Result};
    pub use crate::notify::{SubscriptionHandle, WatchEvent};
}
