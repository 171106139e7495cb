//! Configuration change notification.
//!
//! File watching on the source path and subscriber callbacks fired after
//! each successful reload.

pub mod subscriber;
pub mod watcher;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
pub use watcher::{ChangeWatcher, WatchEvent};
