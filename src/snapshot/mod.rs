//! Snapshot persistence: a value-typed codec for the whole tree plus the
//! file store it is saved to between runs.

pub mod codec;
mod store;

pub use codec::SnapshotError;
pub use store::SnapshotStore;
