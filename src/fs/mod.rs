//! The in-memory file system tree.
//!
//! Nodes live in a flat arena and are either directories (holding named
//! children) or files (holding content). The engine owns the arena plus
//! the current-directory reference and implements every operation; path
//! resolution and search are read-only layers on the same arena.

mod engine;
mod error;
mod node;
mod path;
mod search;
mod shared;

pub use engine::{MakeDirOptions, TransferOptions, TreeEngine};
pub use error::FsError;
pub use node::{DirEntry, EntryKind};
pub use search::{Search, SearchOptions};
pub use shared::SharedFs;

pub(crate) use node::{Node, NodeArena, NodeId, NodeKind};
