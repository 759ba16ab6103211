use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use derive_more::Display;
use hashlink::LinkedHashMap;

/// Identifier of a node in the arena. Stable for the node's lifetime and
/// never reused while the owning engine is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// A single entry of the tree: either a directory holding named children
/// or a file holding its content. Children keep insertion order, so
/// listings reflect creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory {
        children: LinkedHashMap<String, NodeId>,
    },
    File {
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    /// Back-reference for `..` resolution and absolute-path construction.
    /// `None` only for the root. Never owns the parent.
    pub parent: Option<NodeId>,
    pub created_at: u64,
    pub modified_at: u64,
    pub kind: NodeKind,
}

impl Node {
    pub fn directory(name: impl Into<String>, parent: Option<NodeId>, timestamp: u64) -> Self {
        Node {
            name: name.into(),
            parent,
            created_at: timestamp,
            modified_at: timestamp,
            kind: NodeKind::Directory {
                children: LinkedHashMap::new(),
            },
        }
    }

    pub fn file(
        name: impl Into<String>,
        parent: Option<NodeId>,
        content: String,
        timestamp: u64,
    ) -> Self {
        Node {
            name: name.into(),
            parent,
            created_at: timestamp,
            modified_at: timestamp,
            kind: NodeKind::File { content },
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }
}

/// Flat table owning every node of one tree, keyed by `NodeId`. Structural
/// relations (children, parent) are id links, so moves and copies are
/// re-linking rather than pointer surgery.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: HashMap<u64, Node>,
    next_id: u64,
}

impl NodeArena {
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id.0, node);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id.0)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[&id.0]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(&id.0).unwrap_or_else(|| {
            // Ids are handed out by this arena and removed subtrees drop
            // their ids with them, so a dangling id is a logic bug.
            panic!("stale node id")
        })
    }
}

/// What kind of node a listing row describes.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    #[display("dir")]
    Directory,
    #[display("file")]
    File,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Content size in bytes; `None` for directories.
    pub size: Option<u64>,
    pub created_at: u64,
    pub modified_at: u64,
}
