use std::time::SystemTime;

use snafu::ensure;

use crate::ext::SystemTimeExt;
use crate::fs::error::{
    AlreadyExistsSnafu, FsError, InvalidOperationSnafu, NotADirectorySnafu, NotAFileSnafu,
    PathNotFoundSnafu,
};
use crate::fs::node::{DirEntry, EntryKind, Node, NodeArena, NodeId, NodeKind};
use crate::fs::path::{self, Resolved};
use crate::fs::search::{Search, SearchOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct MakeDirOptions {
    /// Create missing intermediate directories, like `mkdir -p`.
    pub create_parents: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    /// Replace an existing file at the destination instead of failing.
    /// Never replaces a directory.
    pub overwrite: bool,
}

/// The tree engine: owns the arena, the root and the current directory,
/// and implements every mutating and read operation. Paths are resolved
/// relative to the current directory unless they start with `/`.
///
/// Failed operations leave the tree untouched; every method validates
/// fully before its first mutation.
#[derive(Debug, Clone)]
pub struct TreeEngine {
    arena: NodeArena,
    root: NodeId,
    cwd: NodeId,
}

impl TreeEngine {
    /// An empty tree: just the root directory, which is also the initial
    /// current directory.
    pub fn new() -> Self {
        let mut arena = NodeArena::default();
        let root = arena.insert(Node::directory("", None, Self::now()));
        TreeEngine {
            arena,
            root,
            cwd: root,
        }
    }

    /// Rebuilds an engine around an arena produced by the snapshot codec.
    /// The current directory starts at the root; the codec re-resolves the
    /// stored path afterwards.
    pub(crate) fn from_parts(arena: NodeArena, root: NodeId) -> Self {
        TreeEngine {
            arena,
            root,
            cwd: root,
        }
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn now() -> u64 {
        SystemTime::now().to_unix_millis()
    }

    fn resolve(&self, path: &str) -> Result<Resolved, FsError> {
        path::resolve(&self.arena, self.root, self.cwd, path)
    }

    fn resolve_parent(&self, path: &str) -> Result<(NodeId, String), FsError> {
        path::resolve_parent(&self.arena, self.root, self.cwd, path)
    }

    fn child_of(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        match &self.arena[parent].kind {
            NodeKind::Directory { children } => children.get(name).copied(),
            NodeKind::File { .. } => None,
        }
    }

    fn attach(&mut self, parent: NodeId, name: &str, child: NodeId, now: u64) {
        if let NodeKind::Directory { children } = &mut self.arena[parent].kind {
            children.insert(name.to_string(), child);
        }
        self.arena[parent].modified_at = now;
    }

    fn detach(&mut self, parent: NodeId, name: &str, now: u64) -> Option<NodeId> {
        let detached = match &mut self.arena[parent].kind {
            NodeKind::Directory { children } => children.remove(name),
            NodeKind::File { .. } => None,
        };
        if detached.is_some() {
            self.arena[parent].modified_at = now;
        }
        detached
    }

    /// Releases a detached subtree from the arena.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                if let NodeKind::Directory { children } = node.kind {
                    stack.extend(children.into_iter().map(|(_, child)| child));
                }
            }
        }
    }

    /// Whether `candidate` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.arena[id].parent;
        }
        false
    }

    pub fn make_directory(&mut self, path: &str, options: MakeDirOptions) -> Result<(), FsError> {
        let (absolute, segments) = path::split_segments(path);
        ensure!(
            !segments.is_empty(),
            InvalidOperationSnafu {
                reason: "cannot create the root directory",
            }
        );

        // Walk the existing prefix without touching anything, so a late
        // failure cannot leave half-created intermediates behind.
        let mut current = if absolute { self.root } else { self.cwd };
        let mut remaining = segments.as_slice();
        while let Some((segment, rest)) = remaining.split_first() {
            match path::step(&self.arena, self.root, current, segment, path)? {
                Some(next) => {
                    current = next;
                    remaining = rest;
                }
                None => break,
            }
        }

        ensure!(!remaining.is_empty(), AlreadyExistsSnafu { path });
        ensure!(
            remaining.iter().all(|s| *s != "." && *s != ".."),
            InvalidOperationSnafu {
                reason: format!("'{path}' does not name a creatable entry"),
            }
        );
        if !options.create_parents && remaining.len() > 1 {
            return PathNotFoundSnafu { path }.fail();
        }

        let now = Self::now();
        for segment in remaining {
            let id = self
                .arena
                .insert(Node::directory(*segment, Some(current), now));
            self.attach(current, segment, id, now);
            current = id;
        }
        Ok(())
    }

    pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        ensure!(
            self.arena[resolved.id].is_directory(),
            NotADirectorySnafu { path }
        );
        self.cwd = resolved.id;
        Ok(())
    }

    /// Absolute path of the current directory.
    pub fn current_directory(&self) -> String {
        path::absolute_path_of(&self.arena, self.cwd)
    }

    /// Children of the directory at `path`, in creation order.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let resolved = self.resolve(path)?;
        match &self.arena[resolved.id].kind {
            NodeKind::Directory { children } => Ok(children
                .iter()
                .map(|(name, id)| self.entry_for(name, *id))
                .collect()),
            NodeKind::File { .. } => NotADirectorySnafu { path }.fail(),
        }
    }

    fn entry_for(&self, name: &str, id: NodeId) -> DirEntry {
        let node = &self.arena[id];
        let (kind, size) = match &node.kind {
            NodeKind::Directory { .. } => (EntryKind::Directory, None),
            NodeKind::File { content } => (EntryKind::File, Some(content.len() as u64)),
        };
        DirEntry {
            name: name.to_string(),
            kind,
            size,
            created_at: node.created_at,
            modified_at: node.modified_at,
        }
    }

    /// Creates an empty file; the name must be free.
    pub fn create_file(&mut self, path: &str) -> Result<(), FsError> {
        let (parent, name) = self.resolve_parent(path)?;
        ensure!(
            self.child_of(parent, &name).is_none(),
            AlreadyExistsSnafu { path }
        );
        let now = Self::now();
        let id = self
            .arena
            .insert(Node::file(&name, Some(parent), String::new(), now));
        self.attach(parent, &name, id, now);
        Ok(())
    }

    /// Writes `content` to the file at `path`, creating it if absent.
    /// Overwriting bumps only the modification time.
    pub fn write_file(&mut self, path: &str, content: impl Into<String>) -> Result<(), FsError> {
        let (parent, name) = self.resolve_parent(path)?;
        let now = Self::now();
        match self.child_of(parent, &name) {
            Some(existing) => {
                let node = &mut self.arena[existing];
                match &mut node.kind {
                    NodeKind::File { content: existing_content } => {
                        *existing_content = content.into();
                        node.modified_at = now;
                        Ok(())
                    }
                    NodeKind::Directory { .. } => NotAFileSnafu { path }.fail(),
                }
            }
            None => {
                let id = self
                    .arena
                    .insert(Node::file(&name, Some(parent), content.into(), now));
                self.attach(parent, &name, id, now);
                Ok(())
            }
        }
    }

    pub fn read_file(&self, path: &str) -> Result<&str, FsError> {
        let resolved = self.resolve(path)?;
        match &self.arena[resolved.id].kind {
            NodeKind::File { content } => Ok(content),
            NodeKind::Directory { .. } => NotAFileSnafu { path }.fail(),
        }
    }

    /// Removes the node at `path` and its whole subtree. If the current
    /// directory lived inside the removed subtree it re-points to the
    /// removed node's parent.
    pub fn remove(&mut self, path: &str) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        let parent = match resolved.parent {
            Some(parent) => parent,
            None => {
                return InvalidOperationSnafu {
                    reason: "cannot remove the root directory",
                }
                .fail();
            }
        };

        if self.is_ancestor_or_self(resolved.id, self.cwd) {
            self.cwd = parent;
        }
        let name = self.arena[resolved.id].name.clone();
        self.detach(parent, &name, Self::now());
        self.release(resolved.id);
        Ok(())
    }

    /// Moves the node at `source` to `destination`. A destination that
    /// resolves to an existing directory means "into it, under the
    /// source's name". Node timestamps travel with the subtree.
    pub fn rename(
        &mut self,
        source: &str,
        destination: &str,
        options: TransferOptions,
    ) -> Result<(), FsError> {
        let src = self.resolve(source)?;
        let src_parent = match src.parent {
            Some(parent) => parent,
            None => {
                return InvalidOperationSnafu {
                    reason: "cannot move the root directory",
                }
                .fail();
            }
        };
        let (dest_parent, dest_name, replaced) =
            self.transfer_target(src.id, destination, options)?;
        ensure!(
            !self.is_ancestor_or_self(src.id, dest_parent),
            InvalidOperationSnafu {
                reason: format!("cannot move '{source}' into its own subtree"),
            }
        );

        let now = Self::now();
        if let Some(existing) = replaced {
            self.replace_existing(existing, dest_parent, now);
        }
        let src_name = self.arena[src.id].name.clone();
        self.detach(src_parent, &src_name, now);
        self.arena[src.id].name = dest_name.clone();
        self.arena[src.id].parent = Some(dest_parent);
        self.attach(dest_parent, &dest_name, src.id, now);
        Ok(())
    }

    /// Copies the subtree at `source` to `destination` under the same
    /// destination rules as [`rename`](Self::rename). The copy is a fresh,
    /// independently owned subtree with fresh timestamps; the source stays
    /// untouched.
    pub fn copy(
        &mut self,
        source: &str,
        destination: &str,
        options: TransferOptions,
    ) -> Result<(), FsError> {
        let src = self.resolve(source)?;
        let (dest_parent, dest_name, replaced) =
            self.transfer_target(src.id, destination, options)?;
        ensure!(
            !self.is_ancestor_or_self(src.id, dest_parent),
            InvalidOperationSnafu {
                reason: format!("cannot copy '{source}' into its own subtree"),
            }
        );

        let now = Self::now();
        if let Some(existing) = replaced {
            self.replace_existing(existing, dest_parent, now);
        }
        let copy = self.duplicate(src.id, &dest_name, dest_parent, now);
        self.attach(dest_parent, &dest_name, copy, now);
        Ok(())
    }

    /// Resolves a move/copy destination into the directory to attach
    /// under, the final name, and an existing node to replace (only ever
    /// `Some` when `overwrite` allowed it).
    fn transfer_target(
        &self,
        src: NodeId,
        destination: &str,
        options: TransferOptions,
    ) -> Result<(NodeId, String, Option<NodeId>), FsError> {
        let (parent, name) = match self.resolve(destination) {
            Ok(resolved) if self.arena[resolved.id].is_directory() => {
                (resolved.id, self.arena[src].name.clone())
            }
            Ok(resolved) => {
                let node = &self.arena[resolved.id];
                // A file cannot be the root, so the parent is present.
                (resolved.parent.unwrap_or(self.root), node.name.clone())
            }
            Err(FsError::PathNotFound { .. }) => self.resolve_parent(destination)?,
            Err(other) => return Err(other),
        };

        match self.child_of(parent, &name) {
            None => Ok((parent, name, None)),
            Some(existing) if existing == src => InvalidOperationSnafu {
                reason: format!("'{destination}' is the source itself"),
            }
            .fail(),
            Some(existing) => {
                ensure!(options.overwrite, AlreadyExistsSnafu { path: destination });
                ensure!(
                    !self.arena[existing].is_directory(),
                    AlreadyExistsSnafu { path: destination }
                );
                Ok((parent, name, Some(existing)))
            }
        }
    }

    fn replace_existing(&mut self, existing: NodeId, dest_parent: NodeId, now: u64) {
        if self.is_ancestor_or_self(existing, self.cwd) {
            self.cwd = dest_parent;
        }
        let name = self.arena[existing].name.clone();
        self.detach(dest_parent, &name, now);
        self.release(existing);
    }

    /// Deep-copies the subtree at `source` as `name` under `parent`.
    /// Copied nodes get fresh ids and fresh timestamps.
    fn duplicate(&mut self, source: NodeId, name: &str, parent: NodeId, now: u64) -> NodeId {
        match self.arena[source].kind.clone() {
            NodeKind::File { content } => {
                self.arena
                    .insert(Node::file(name, Some(parent), content, now))
            }
            NodeKind::Directory { children } => {
                let copy = self.arena.insert(Node::directory(name, Some(parent), now));
                for (child_name, child_id) in children {
                    let child_copy = self.duplicate(child_id, &child_name, copy, now);
                    if let NodeKind::Directory { children } = &mut self.arena[copy].kind {
                        children.insert(child_name, child_copy);
                    }
                }
                copy
            }
        }
    }

    /// Lazy depth-first search below `root_path`; see [`SearchOptions`].
    pub fn search(
        &self,
        root_path: &str,
        pattern: &str,
        options: SearchOptions,
    ) -> Result<Search<'_>, FsError> {
        let resolved = self.resolve(root_path)?;
        Ok(Search::new(&self.arena, resolved.id, pattern, options))
    }
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new()
    }
}
