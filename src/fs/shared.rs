use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::fs::engine::{MakeDirOptions, TransferOptions, TreeEngine};
use crate::fs::error::FsError;
use crate::fs::node::DirEntry;
use crate::fs::search::SearchOptions;

/// Cloneable handle sharing one [`TreeEngine`] between collaborators
/// behind a single coarse lock. Mutations serialize through the write
/// lock; read-only operations may run concurrently with each other but
/// never with a mutation, so callers observe a total serial order.
#[derive(Debug, Clone)]
pub struct SharedFs {
    engine: Arc<RwLock<TreeEngine>>,
}

impl SharedFs {
    pub fn new(engine: TreeEngine) -> Self {
        SharedFs {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    // The engine validates fully before mutating, so a panic cannot leave
    // a half-applied operation behind and a poisoned lock is recoverable.
    fn read(&self) -> RwLockReadGuard<'_, TreeEngine> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeEngine> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn make_directory(&self, path: &str, options: MakeDirOptions) -> Result<(), FsError> {
        self.write().make_directory(path, options)
    }

    pub fn change_directory(&self, path: &str) -> Result<(), FsError> {
        self.write().change_directory(path)
    }

    pub fn current_directory(&self) -> String {
        self.read().current_directory()
    }

    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        self.read().list_directory(path)
    }

    pub fn create_file(&self, path: &str) -> Result<(), FsError> {
        self.write().create_file(path)
    }

    pub fn write_file(&self, path: &str, content: impl Into<String>) -> Result<(), FsError> {
        self.write().write_file(path, content)
    }

    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.read().read_file(path).map(str::to_string)
    }

    pub fn remove(&self, path: &str) -> Result<(), FsError> {
        self.write().remove(path)
    }

    pub fn rename(
        &self,
        source: &str,
        destination: &str,
        options: TransferOptions,
    ) -> Result<(), FsError> {
        self.write().rename(source, destination, options)
    }

    pub fn copy(
        &self,
        source: &str,
        destination: &str,
        options: TransferOptions,
    ) -> Result<(), FsError> {
        self.write().copy(source, destination, options)
    }

    /// Runs the whole traversal under the read lock and returns the
    /// collected matches.
    pub fn search(
        &self,
        root_path: &str,
        pattern: &str,
        options: SearchOptions,
    ) -> Result<Vec<String>, FsError> {
        let engine = self.read();
        let matches = engine.search(root_path, pattern, options)?.collect();
        Ok(matches)
    }

    /// Read access to the engine for callers outside the operation
    /// surface, e.g. snapshot encoding. Runs under the read lock so the
    /// view is a consistent point in time.
    pub fn with_engine<R>(&self, f: impl FnOnce(&TreeEngine) -> R) -> R {
        f(&self.read())
    }
}
