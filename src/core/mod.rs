//! Core store types: immutable snapshots and the hot-reloading store.

mod snapshot;
mod store;

pub use snapshot::Snapshot;
pub use store::ConfigStore;
