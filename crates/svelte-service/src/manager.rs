//! Snapshot bookkeeping for one project.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use svelte_projection::Snapshot;

#[derive(Debug, Default)]
struct Inner {
    /// At most one snapshot per path.
    snapshots: IndexMap<Utf8PathBuf, Arc<Snapshot>>,
    /// Files the project configuration declares.
    project_files: IndexSet<Utf8PathBuf>,
    /// Paths deleted explicitly. They resolve as missing until a new snapshot
    /// is set for them.
    deleted: FxHashSet<Utf8PathBuf>,
}

/// Tracks the current snapshot of every file a project has seen.
#[derive(Debug, Default)]
pub struct SnapshotManager {
    inner: RwLock<Inner>,
}

impl SnapshotManager {
    pub fn new(project_files: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                project_files: project_files.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.inner.read().snapshots.get(path).cloned()
    }

    /// Stores `snapshot` as the current one for its path and returns the one
    /// it replaced. Lifts any deletion of the path.
    pub fn set(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        let mut inner = self.inner.write();
        inner.deleted.remove(snapshot.path());
        inner
            .snapshots
            .insert(snapshot.path().to_path_buf(), snapshot)
    }

    /// Stores `snapshot` unless the path already has one or was deleted.
    /// Returns the snapshot now current for the path.
    pub fn insert_if_absent(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        let mut inner = self.inner.write();
        if inner.deleted.contains(snapshot.path()) {
            return None;
        }
        let current = inner
            .snapshots
            .entry(snapshot.path().to_path_buf())
            .or_insert(snapshot);
        Some(Arc::clone(current))
    }

    /// Evicts the snapshot for `path` and marks the path deleted.
    pub fn delete(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        let mut inner = self.inner.write();
        inner.deleted.insert(path.to_path_buf());
        inner.snapshots.shift_remove(path)
    }

    /// Lifts a deletion without setting a snapshot, e.g. when the file
    /// reappears on disk.
    pub fn restore(&self, path: &Utf8Path) -> bool {
        self.inner.write().deleted.remove(path)
    }

    pub fn is_deleted(&self, path: &Utf8Path) -> bool {
        self.inner.read().deleted.contains(path)
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.inner.read().snapshots.contains_key(path)
    }

    /// Declared project files that are not deleted.
    pub fn project_file_names(&self) -> Vec<Utf8PathBuf> {
        let inner = self.inner.read();
        inner
            .project_files
            .iter()
            .filter(|path| !inner.deleted.contains(*path))
            .cloned()
            .collect()
    }

    /// Declared project files followed by every other file with a snapshot.
    pub fn file_names(&self) -> Vec<Utf8PathBuf> {
        let inner = self.inner.read();
        let mut names: IndexSet<Utf8PathBuf> = inner
            .project_files
            .iter()
            .filter(|path| !inner.deleted.contains(*path))
            .cloned()
            .collect();
        names.extend(inner.snapshots.keys().cloned());
        names.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().snapshots.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.snapshots.clear();
        inner.deleted.clear();
    }
}
