//! One checking service per project.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use source_map::ByteOffset;
use svelte_projection::{Snapshot, SnapshotOrigin};
use tracing::{debug, error, info};

use crate::config::ConfigurationScope;
use crate::document::Document;
use crate::engine::{CheckingEngine, CheckingSession, Completion, MappedDiagnostic, SymbolLocation};
use crate::error::ServiceError;
use crate::factory::SnapshotFactory;
use crate::fs::FileSystem;
use crate::overlay::ResolutionOverlay;

/// Lifecycle of a container once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Ready,
    /// Swapping in a new checking session.
    Rebuilding,
    Disposed,
}

/// What to refresh a snapshot from.
#[derive(Debug, Clone)]
pub enum SnapshotInput {
    /// Use the current snapshot, or read the file if there is none.
    Path(Utf8PathBuf),
    /// An editor buffer.
    Document(Document),
}

impl SnapshotInput {
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Path(path) => path,
            Self::Document(document) => &document.path,
        }
    }
}

/// A file system event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Created,
    Changed,
    Deleted,
}

/// Owns one project's snapshots, host overlay and checking session.
pub struct ServiceContainer {
    overlay: Arc<ResolutionOverlay>,
    engine: Arc<dyn CheckingEngine>,
    session: RwLock<Arc<dyn CheckingSession>>,
    state: RwLock<ContainerState>,
}

impl ServiceContainer {
    pub fn new(
        scope: ConfigurationScope,
        factory: SnapshotFactory,
        fs: Arc<dyn FileSystem>,
        engine: Arc<dyn CheckingEngine>,
    ) -> Self {
        let overlay = Arc::new(ResolutionOverlay::new(scope, factory, fs));
        let session = engine.create_session(Arc::clone(&overlay), &overlay.scope().settings);
        info!(
            scope = %overlay.scope().id,
            files = overlay.scope().declared_files.len(),
            "created checking service"
        );
        Self {
            overlay,
            engine,
            session: RwLock::new(session),
            state: RwLock::new(ContainerState::Ready),
        }
    }

    pub fn scope(&self) -> &ConfigurationScope {
        self.overlay.scope()
    }

    pub fn overlay(&self) -> &Arc<ResolutionOverlay> {
        &self.overlay
    }

    pub fn state(&self) -> ContainerState {
        *self.state.read()
    }

    /// The current checking session. It is replaced when a file changes
    /// script kind, so do not hold on to it across updates.
    pub fn session(&self) -> Arc<dyn CheckingSession> {
        Arc::clone(&self.session.read())
    }

    pub fn snapshot(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.overlay.snapshots().get(path)
    }

    /// Returns the snapshot for the input, rebuilding it only when needed.
    ///
    /// A path returns the existing snapshot unchanged; a document with the
    /// version already held does too. A failed build leaves the previous
    /// snapshot in place.
    pub fn update_snapshot(&self, input: SnapshotInput) -> Result<Arc<Snapshot>, ServiceError> {
        self.ensure_live()?;
        let snapshots = self.overlay.snapshots();
        match input {
            SnapshotInput::Path(path) => {
                if let Some(snapshot) = snapshots.get(&path) {
                    return Ok(snapshot);
                }
                let document = self
                    .overlay
                    .factory()
                    .open(&path)
                    .ok_or(ServiceError::NotFound(path))?;
                self.install(document, SnapshotOrigin::Disk)
            }
            SnapshotInput::Document(document) => {
                if let Some(snapshot) = snapshots.get(&document.path) {
                    if snapshot.version() == document.version
                        && snapshot.origin() == SnapshotOrigin::Editor
                    {
                        return Ok(snapshot);
                    }
                }
                self.install(document, SnapshotOrigin::Editor)
            }
        }
    }

    fn install(&self, document: Document, origin: SnapshotOrigin) -> Result<Arc<Snapshot>, ServiceError> {
        let path = document.path.clone();
        let snapshot = match self.overlay.factory().build(document, origin) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                error!(path = %path, error = %err, "failed to build snapshot");
                return Err(err);
            }
        };

        match self.overlay.snapshots().set(Arc::clone(&snapshot)) {
            Some(previous) if previous.script_kind() != snapshot.script_kind() => {
                info!(
                    path = %path,
                    from = ?previous.script_kind(),
                    to = ?snapshot.script_kind(),
                    "script kind changed, rebuilding checking session"
                );
                self.rebuild_session();
            }
            Some(_) => {}
            None => self.overlay.invalidate_unresolved(&path),
        }
        debug!(path = %path, version = snapshot.version(), "updated snapshot");
        Ok(snapshot)
    }

    /// Replaces the session. Snapshots are kept as they are.
    fn rebuild_session(&self) {
        *self.state.write() = ContainerState::Rebuilding;
        let fresh = self
            .engine
            .create_session(Arc::clone(&self.overlay), &self.scope().settings);
        let previous = std::mem::replace(&mut *self.session.write(), fresh);
        previous.dispose();
        *self.state.write() = ContainerState::Ready;
    }

    /// Evicts the snapshot for `path`. Resolution treats the path as missing
    /// until a new snapshot is created for it.
    pub fn delete_snapshot(&self, path: &Utf8Path) -> bool {
        let removed = self.overlay.snapshots().delete(path).is_some();
        self.overlay.invalidate_path(path);
        self.session().forget(path);
        debug!(path = %path, removed, "deleted snapshot");
        removed
    }

    /// Applies a file system event.
    pub fn file_changed(&self, path: &Utf8Path, kind: FileChangeKind) -> Result<(), ServiceError> {
        self.ensure_live()?;
        match kind {
            FileChangeKind::Created => {
                self.overlay.snapshots().restore(path);
                self.overlay.invalidate_unresolved(path);
            }
            FileChangeKind::Changed => {
                self.overlay.invalidate_path(path);
                let from_disk = self
                    .snapshot(path)
                    .is_some_and(|snapshot| snapshot.origin() == SnapshotOrigin::Disk);
                // Open editor buffers take precedence over the disk.
                if from_disk {
                    let document = self
                        .overlay
                        .factory()
                        .open(path)
                        .ok_or_else(|| ServiceError::NotFound(path.to_path_buf()))?;
                    self.install(document, SnapshotOrigin::Disk)?;
                }
                self.session().forget(path);
            }
            FileChangeKind::Deleted => {
                self.delete_snapshot(path);
            }
        }
        Ok(())
    }

    /// Diagnostics for `path` in original coordinates. Diagnostics that only
    /// cover generated text are dropped.
    pub fn diagnostics(&self, path: &Utf8Path) -> Result<Vec<MappedDiagnostic>, ServiceError> {
        let snapshot = self.update_snapshot(SnapshotInput::Path(path.to_path_buf()))?;
        let diagnostics = self
            .session()
            .diagnostics(path)
            .into_iter()
            .filter_map(|diagnostic| {
                let span = snapshot.original_span(diagnostic.span)?;
                Some(MappedDiagnostic {
                    file: path.to_path_buf(),
                    span,
                    start: snapshot.original_line_col(span.start)?,
                    end: snapshot.original_line_col(span.end)?,
                    message: diagnostic.message,
                    code: diagnostic.code,
                    severity: diagnostic.severity,
                })
            })
            .collect();
        Ok(diagnostics)
    }

    /// Completions at an original offset.
    pub fn completions(&self, path: &Utf8Path, offset: ByteOffset) -> Result<Vec<Completion>, ServiceError> {
        let snapshot = self.update_snapshot(SnapshotInput::Path(path.to_path_buf()))?;
        let Some(projected) = snapshot.projected_offset(offset) else {
            return Ok(Vec::new());
        };
        let completions = self
            .session()
            .completions(path, projected)
            .into_iter()
            .map(|completion| Completion {
                replace: completion
                    .replace
                    .and_then(|span| snapshot.original_span(span)),
                ..completion
            })
            .collect();
        Ok(completions)
    }

    /// Definition sites of the symbol at an original offset. Sites inside
    /// generated text are dropped.
    pub fn definition(&self, path: &Utf8Path, offset: ByteOffset) -> Result<Vec<SymbolLocation>, ServiceError> {
        let snapshot = self.update_snapshot(SnapshotInput::Path(path.to_path_buf()))?;
        let Some(projected) = snapshot.projected_offset(offset) else {
            return Ok(Vec::new());
        };
        let locations = self
            .session()
            .definition(path, projected)
            .into_iter()
            .filter_map(|location| {
                let span = match self.overlay.snapshot(&location.path) {
                    Some(target) => target.original_span(location.span)?,
                    None => location.span,
                };
                Some(SymbolLocation {
                    path: location.path,
                    span,
                })
            })
            .collect();
        Ok(locations)
    }

    /// Disposes the session and drops all snapshots.
    pub fn dispose(&self) {
        {
            let mut state = self.state.write();
            if *state == ContainerState::Disposed {
                return;
            }
            *state = ContainerState::Disposed;
        }
        self.session().dispose();
        self.overlay.snapshots().clear();
        info!(scope = %self.scope().id, "disposed checking service");
    }

    fn ensure_live(&self) -> Result<(), ServiceError> {
        match self.state() {
            ContainerState::Disposed => Err(ServiceError::Disposed(self.scope().id.clone())),
            _ => Ok(()),
        }
    }
}
