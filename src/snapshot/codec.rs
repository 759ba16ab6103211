use bincode::{Decode, Encode};
use hashlink::LinkedHashMap;
use snafu::{ResultExt, Snafu, ensure};

use crate::fs::{Node, NodeArena, NodeId, NodeKind, TreeEngine};

/// Compression level for the persisted blob; the trees are small, the
/// default level is plenty.
const ZSTD_LEVEL: i32 = 0;

/// Value-typed image of a whole tree plus the current-directory path.
/// This is what goes over the wire; ids and parent links are rebuilt on
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub(crate) struct Snapshot {
    pub(crate) root: SnapshotNode,
    pub(crate) current_directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub(crate) enum SnapshotNode {
    Directory {
        name: String,
        created_at: u64,
        modified_at: u64,
        children: Vec<SnapshotNode>,
    },
    File {
        name: String,
        created_at: u64,
        modified_at: u64,
        content: String,
    },
}

/// Encodes the whole tree, bincode first and zstd on top.
pub fn encode(engine: &TreeEngine) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = Snapshot {
        root: snapshot_node(engine.arena(), engine.root()),
        current_directory: engine.current_directory(),
    };
    let encoded = bincode::encode_to_vec(&snapshot, bincode::config::standard())
        .context(EncodeSnafu)?;
    zstd::encode_all(encoded.as_slice(), ZSTD_LEVEL).context(CompressSnafu)
}

/// Decodes a blob produced by [`encode`] back into an engine, rebuilding
/// the arena bottom-up with fresh ids and re-established parent links.
///
/// A stored current-directory path that no longer resolves falls back to
/// the root; that is a deliberate policy for snapshots from older trees,
/// not silent corruption. Everything structurally wrong with the blob is
/// a [`SnapshotError`].
pub fn decode(blob: &[u8]) -> Result<TreeEngine, SnapshotError> {
    let bytes = zstd::decode_all(blob).context(DecompressSnafu)?;
    let (snapshot, _): (Snapshot, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard()).context(DecodeSnafu)?;

    ensure!(
        matches!(&snapshot.root, SnapshotNode::Directory { name, .. } if name.is_empty()),
        MalformedSnapshotSnafu {
            detail: "root must be an unnamed directory",
        }
    );

    let mut arena = NodeArena::default();
    let root = rebuild(&mut arena, &snapshot.root, None)?;
    let mut engine = TreeEngine::from_parts(arena, root);
    let _ = engine.change_directory(&snapshot.current_directory);
    Ok(engine)
}

fn snapshot_node(arena: &NodeArena, id: NodeId) -> SnapshotNode {
    let node = &arena[id];
    match &node.kind {
        NodeKind::File { content } => SnapshotNode::File {
            name: node.name.clone(),
            created_at: node.created_at,
            modified_at: node.modified_at,
            content: content.clone(),
        },
        NodeKind::Directory { children } => SnapshotNode::Directory {
            name: node.name.clone(),
            created_at: node.created_at,
            modified_at: node.modified_at,
            children: children
                .iter()
                .map(|(_, child)| snapshot_node(arena, *child))
                .collect(),
        },
    }
}

fn rebuild(
    arena: &mut NodeArena,
    node: &SnapshotNode,
    parent: Option<NodeId>,
) -> Result<NodeId, SnapshotError> {
    match node {
        SnapshotNode::File {
            name,
            created_at,
            modified_at,
            content,
        } => Ok(arena.insert(Node {
            name: name.clone(),
            parent,
            created_at: *created_at,
            modified_at: *modified_at,
            kind: NodeKind::File {
                content: content.clone(),
            },
        })),
        SnapshotNode::Directory {
            name,
            created_at,
            modified_at,
            children,
        } => {
            let id = arena.insert(Node {
                name: name.clone(),
                parent,
                created_at: *created_at,
                modified_at: *modified_at,
                kind: NodeKind::Directory {
                    children: LinkedHashMap::new(),
                },
            });
            for child in children {
                let child_id = rebuild(arena, child, Some(id))?;
                let child_name = arena[child_id].name.clone();
                ensure!(
                    !child_name.is_empty() && !child_name.contains('/'),
                    MalformedSnapshotSnafu {
                        detail: format!("invalid child name '{child_name}'"),
                    }
                );
                let duplicate = match &mut arena[id].kind {
                    NodeKind::Directory { children } => {
                        children.insert(child_name.clone(), child_id).is_some()
                    }
                    NodeKind::File { .. } => false,
                };
                ensure!(
                    !duplicate,
                    MalformedSnapshotSnafu {
                        detail: format!("duplicate sibling name '{child_name}'"),
                    }
                );
            }
            Ok(id)
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SnapshotError {
    #[snafu(display("Failed to encode the snapshot"))]
    EncodeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to compress the snapshot"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Failed to decompress the snapshot"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Failed to decode the snapshot"))]
    DecodeError { source: bincode::error::DecodeError },
    #[snafu(display("Malformed snapshot: {}", detail))]
    MalformedSnapshot { detail: String },
    #[snafu(display("Failed to read the snapshot file '{}'", path))]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write the snapshot file '{}'", path))]
    WriteError {
        path: String,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MakeDirOptions, SearchOptions};

    fn populated() -> TreeEngine {
        let mut engine = TreeEngine::new();
        engine
            .make_directory("/docs/archive", MakeDirOptions { create_parents: true })
            .unwrap();
        engine.write_file("/docs/readme.txt", "hello world").unwrap();
        engine.write_file("/docs/archive/old.txt", "bye").unwrap();
        engine.change_directory("/docs/archive").unwrap();
        engine
    }

    #[test]
    fn round_trip_preserves_structure_content_and_cwd() {
        let engine = populated();
        let blob = encode(&engine).unwrap();
        let restored = decode(&blob).unwrap();

        assert_eq!(restored.current_directory(), "/docs/archive");
        assert_eq!(restored.read_file("/docs/readme.txt").unwrap(), "hello world");
        assert_eq!(restored.read_file("/docs/archive/old.txt").unwrap(), "bye");

        let original: Vec<_> = engine.list_directory("/docs").unwrap();
        let reloaded: Vec<_> = restored.list_directory("/docs").unwrap();
        assert_eq!(original, reloaded);
    }

    #[test]
    fn round_trip_preserves_timestamps() {
        let engine = populated();
        let before = engine.list_directory("/docs").unwrap();
        let restored = decode(&encode(&engine).unwrap()).unwrap();
        let after = restored.list_directory("/docs").unwrap();
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.created_at, a.created_at);
            assert_eq!(b.modified_at, a.modified_at);
        }
    }

    #[test]
    fn restored_tree_stays_fully_operational() {
        let restored = decode(&encode(&populated()).unwrap()).unwrap();
        let mut engine = restored;
        engine.write_file("extra.txt", "new").unwrap();
        assert_eq!(engine.read_file("/docs/archive/extra.txt").unwrap(), "new");
        let hits: Vec<_> = engine
            .search(
                "/docs",
                "hello",
                SearchOptions {
                    match_names: false,
                    match_content: true,
                    case_sensitive: true,
                },
            )
            .unwrap()
            .collect();
        assert_eq!(hits, ["/docs/readme.txt"]);
    }

    #[test]
    fn garbage_blob_is_rejected() {
        assert!(matches!(
            decode(b"not a snapshot"),
            Err(SnapshotError::DecompressError { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let blob = encode(&populated()).unwrap();
        let bytes = zstd::decode_all(blob.as_slice()).unwrap();
        let truncated = zstd::encode_all(&bytes[..bytes.len() / 2], 0).unwrap();
        assert!(matches!(
            decode(&truncated),
            Err(SnapshotError::DecodeError { .. })
        ));
    }

    #[test]
    fn file_typed_root_is_malformed() {
        let snapshot = Snapshot {
            root: SnapshotNode::File {
                name: String::new(),
                created_at: 0,
                modified_at: 0,
                content: String::new(),
            },
            current_directory: "/".into(),
        };
        let bytes = bincode::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
        let blob = zstd::encode_all(bytes.as_slice(), 0).unwrap();
        assert!(matches!(
            decode(&blob),
            Err(SnapshotError::MalformedSnapshot { .. })
        ));
    }

    #[test]
    fn duplicate_sibling_names_are_malformed() {
        let child = |name: &str| SnapshotNode::File {
            name: name.into(),
            created_at: 0,
            modified_at: 0,
            content: String::new(),
        };
        let snapshot = Snapshot {
            root: SnapshotNode::Directory {
                name: String::new(),
                created_at: 0,
                modified_at: 0,
                children: vec![child("f"), child("f")],
            },
            current_directory: "/".into(),
        };
        let bytes = bincode::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
        let blob = zstd::encode_all(bytes.as_slice(), 0).unwrap();
        assert!(matches!(
            decode(&blob),
            Err(SnapshotError::MalformedSnapshot { .. })
        ));
    }

    #[test]
    fn unresolvable_stored_cwd_falls_back_to_root() {
        let snapshot = Snapshot {
            root: SnapshotNode::Directory {
                name: String::new(),
                created_at: 0,
                modified_at: 0,
                children: Vec::new(),
            },
            current_directory: "/gone".into(),
        };
        let bytes = bincode::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
        let blob = zstd::encode_all(bytes.as_slice(), 0).unwrap();
        let restored = decode(&blob).unwrap();
        assert_eq!(restored.current_directory(), "/");
    }
}
