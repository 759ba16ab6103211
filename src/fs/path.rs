//! Pure path resolution over a node arena. Nothing in here mutates the
//! tree; callers get back ids plus typed failures.

use crate::fs::error::{FsError, InvalidOperationSnafu, NotADirectorySnafu, PathNotFoundSnafu};
use crate::fs::node::{NodeArena, NodeId, NodeKind};
use snafu::ensure;

pub const SEPARATOR: char = '/';

/// A resolved path: the node it names and the directory holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: NodeId,
    /// Immediate parent directory; `None` only when the path names the root.
    pub parent: Option<NodeId>,
}

/// Splits a path into its lookup segments. Empty segments from repeated
/// separators are discarded; `.` and `..` are kept for the walker.
pub(crate) fn split_segments(path: &str) -> (bool, Vec<&str>) {
    let absolute = path.starts_with(SEPARATOR);
    let segments = path
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();
    (absolute, segments)
}

/// Walks a single segment from `current`. `Ok(None)` means the segment
/// names a child that does not exist; `.` stays put and `..` moves to the
/// parent, with the root as its own parent.
pub(crate) fn step(
    arena: &NodeArena,
    root: NodeId,
    current: NodeId,
    segment: &str,
    full_path: &str,
) -> Result<Option<NodeId>, FsError> {
    let node = &arena[current];
    match &node.kind {
        NodeKind::Directory { children } => match segment {
            "." => Ok(Some(current)),
            ".." => Ok(Some(node.parent.unwrap_or(root))),
            name => Ok(children.get(name).copied()),
        },
        NodeKind::File { .. } => NotADirectorySnafu { path: full_path }.fail(),
    }
}

/// Resolves `path` to a node. Absolute paths start at `root`, relative
/// ones at `start`.
pub fn resolve(
    arena: &NodeArena,
    root: NodeId,
    start: NodeId,
    path: &str,
) -> Result<Resolved, FsError> {
    let (absolute, segments) = split_segments(path);
    let mut current = if absolute { root } else { start };

    for segment in segments {
        current = step(arena, root, current, segment, path)?
            .ok_or_else(|| PathNotFoundSnafu { path }.build())?;
    }

    Ok(Resolved {
        id: current,
        parent: arena[current].parent,
    })
}

/// Resolves everything but the final segment of `path`, for operations
/// that create or attach the final entry. The final segment must be a
/// literal name: creating `.` or `..` is not a meaningful request.
pub fn resolve_parent(
    arena: &NodeArena,
    root: NodeId,
    start: NodeId,
    path: &str,
) -> Result<(NodeId, String), FsError> {
    let (absolute, mut segments) = split_segments(path);
    let name = match segments.pop() {
        Some(segment) if segment != "." && segment != ".." => segment.to_string(),
        _ => {
            return InvalidOperationSnafu {
                reason: format!("'{path}' does not name a creatable entry"),
            }
            .fail();
        }
    };

    let mut current = if absolute { root } else { start };
    for segment in segments {
        current = step(arena, root, current, segment, path)?
            .ok_or_else(|| PathNotFoundSnafu { path }.build())?;
    }
    ensure!(arena[current].is_directory(), NotADirectorySnafu { path });

    Ok((current, name))
}

/// Absolute path of `id`, built by walking the parent chain. The root is
/// rendered as `/`.
pub fn absolute_path_of(arena: &NodeArena, id: NodeId) -> String {
    let mut parts = Vec::new();
    let mut current = id;

    while let Some(parent) = arena[current].parent {
        parts.push(arena[current].name.clone());
        current = parent;
    }

    if parts.is_empty() {
        return SEPARATOR.to_string();
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::node::Node;
    use rstest::rstest;

    /// Arena with `/a`, `/a/b` and `/a/f.txt`.
    fn sample() -> (NodeArena, NodeId) {
        let mut arena = NodeArena::default();
        let root = arena.insert(Node::directory("", None, 0));
        let a = arena.insert(Node::directory("a", Some(root), 0));
        let b = arena.insert(Node::directory("b", Some(a), 0));
        let f = arena.insert(Node::file("f.txt", Some(a), "hi".into(), 0));
        for (parent, name, child) in [(root, "a", a), (a, "b", b), (a, "f.txt", f)] {
            if let NodeKind::Directory { children } = &mut arena[parent].kind {
                children.insert(name.to_string(), child);
            }
        }
        (arena, root)
    }

    #[rstest]
    #[case("/", "/")]
    #[case("/a", "/a")]
    #[case("/a/b", "/a/b")]
    #[case("a/b", "/a/b")]
    #[case("a//b///", "/a/b")]
    #[case("./a/./b", "/a/b")]
    #[case("a/b/..", "/a")]
    #[case("a/b/../..", "/")]
    #[case("..", "/")]
    #[case("../../..", "/")]
    #[case("/a/../a/b", "/a/b")]
    fn resolves_to_expected_absolute_path(#[case] path: &str, #[case] expected: &str) {
        let (arena, root) = sample();
        let resolved = resolve(&arena, root, root, path).unwrap();
        assert_eq!(absolute_path_of(&arena, resolved.id), expected);
    }

    #[test]
    fn relative_resolution_starts_at_the_given_node() {
        let (arena, root) = sample();
        let a = resolve(&arena, root, root, "/a").unwrap().id;
        let resolved = resolve(&arena, root, a, "b").unwrap();
        assert_eq!(absolute_path_of(&arena, resolved.id), "/a/b");
        let up = resolve(&arena, root, a, "..").unwrap();
        assert_eq!(up.id, root);
    }

    #[test]
    fn missing_segment_is_path_not_found() {
        let (arena, root) = sample();
        let result = resolve(&arena, root, root, "/a/missing");
        assert!(matches!(result, Err(FsError::PathNotFound { .. })));
    }

    #[test]
    fn traversal_through_a_file_is_not_a_directory() {
        let (arena, root) = sample();
        let result = resolve(&arena, root, root, "/a/f.txt/x");
        assert!(matches!(result, Err(FsError::NotADirectory { .. })));
    }

    #[test]
    fn resolved_carries_the_parent_directory() {
        let (arena, root) = sample();
        let resolved = resolve(&arena, root, root, "/a/b").unwrap();
        let parent = resolved.parent.unwrap();
        assert_eq!(absolute_path_of(&arena, parent), "/a");
        assert!(resolve(&arena, root, root, "/").unwrap().parent.is_none());
    }

    #[test]
    fn resolve_parent_splits_final_name() {
        let (arena, root) = sample();
        let (parent, name) = resolve_parent(&arena, root, root, "/a/new").unwrap();
        assert_eq!(absolute_path_of(&arena, parent), "/a");
        assert_eq!(name, "new");
    }

    #[rstest]
    #[case("/a/..")]
    #[case("/a/.")]
    #[case("/")]
    #[case("")]
    fn resolve_parent_rejects_non_literal_final_segments(#[case] path: &str) {
        let (arena, root) = sample();
        let result = resolve_parent(&arena, root, root, path);
        assert!(matches!(result, Err(FsError::InvalidOperation { .. })));
    }

    #[test]
    fn resolve_parent_through_a_file_fails() {
        let (arena, root) = sample();
        let result = resolve_parent(&arena, root, root, "/a/f.txt/new");
        assert!(matches!(result, Err(FsError::NotADirectory { .. })));
    }
}
