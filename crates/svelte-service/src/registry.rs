//! Routes files to the service container of their project.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use svelte_projection::Snapshot;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{ConfigDiscovery, ConfigurationScope, ScopeId};
use crate::container::{ContainerState, FileChangeKind, ServiceContainer, SnapshotInput};
use crate::document::{Document, DocumentFactory, MarkupParser};
use crate::engine::{CheckingEngine, CheckingSession};
use crate::error::ServiceError;
use crate::factory::SnapshotFactory;
use crate::fs::FileSystem;

/// The collaborators every container is built from.
#[derive(Clone)]
pub struct ServiceContext {
    pub parser: Arc<dyn MarkupParser>,
    pub engine: Arc<dyn CheckingEngine>,
    pub documents: Arc<dyn DocumentFactory>,
    pub discovery: Arc<dyn ConfigDiscovery>,
    pub fs: Arc<dyn FileSystem>,
}

/// Where a scope is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Uninitialized,
    /// Configuration is loading.
    Initializing,
    Ready,
    Rebuilding,
    Disposed,
}

type ContainerCell = Arc<OnceCell<Arc<ServiceContainer>>>;

/// Maps project scopes to their containers, creating each at most once.
pub struct ServiceRegistry {
    context: ServiceContext,
    workspace_roots: Vec<Utf8PathBuf>,
    containers: Mutex<FxHashMap<ScopeId, ContainerCell>>,
}

impl ServiceRegistry {
    pub fn new(context: ServiceContext, workspace_roots: Vec<Utf8PathBuf>) -> Self {
        Self {
            context,
            workspace_roots,
            containers: Mutex::default(),
        }
    }

    pub fn workspace_roots(&self) -> &[Utf8PathBuf] {
        &self.workspace_roots
    }

    /// Returns the container for the project governing `path`.
    ///
    /// Concurrent callers for the same project wait on a single creation. A
    /// configuration that fails to load yields a container with default
    /// settings. A container whose scope was torn down while it was being
    /// created is disposed and creation starts over.
    pub async fn service_for(&self, path: &Utf8Path) -> Arc<ServiceContainer> {
        let id = self.context.discovery.find_config(path, &self.workspace_roots);
        loop {
            let cell = Arc::clone(self.containers.lock().entry(id.clone()).or_default());
            let container = Arc::clone(
                cell.get_or_init(|| self.create_container(id.clone(), self.fallback_root(path)))
                    .await,
            );
            let registered = self
                .containers
                .lock()
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &cell));
            if registered {
                return container;
            }
            debug!(scope = %id, "scope was disposed during creation, retrying");
            container.dispose();
        }
    }

    /// The checking session for the project governing `path`.
    pub async fn get_service(&self, path: &Utf8Path) -> Arc<dyn CheckingSession> {
        self.service_for(path).await.session()
    }

    /// Feeds an editor buffer to its project.
    pub async fn update_snapshot(&self, document: Document) -> Result<Arc<Snapshot>, ServiceError> {
        let container = self.service_for(&document.path).await;
        container.update_snapshot(SnapshotInput::Document(document))
    }

    /// Evicts `path` from its project. Never creates a container.
    pub fn delete_snapshot(&self, path: &Utf8Path) -> bool {
        let id = self.context.discovery.find_config(path, &self.workspace_roots);
        let cell = self.containers.lock().get(&id).cloned();
        cell.and_then(|cell| cell.get().cloned())
            .is_some_and(|container| container.delete_snapshot(path))
    }

    /// Forwards a file system event to every live container.
    pub fn file_changed(&self, path: &Utf8Path, kind: FileChangeKind) {
        for container in self.containers() {
            if let Err(err) = container.file_changed(path, kind) {
                warn!(
                    scope = %container.scope().id,
                    path = %path,
                    error = %err,
                    "failed to apply file change"
                );
            }
        }
    }

    pub fn state(&self, id: &ScopeId) -> ScopeState {
        let Some(cell) = self.containers.lock().get(id).cloned() else {
            return ScopeState::Uninitialized;
        };
        match cell.get().map(|container| container.state()) {
            None => ScopeState::Initializing,
            Some(ContainerState::Ready) => ScopeState::Ready,
            Some(ContainerState::Rebuilding) => ScopeState::Rebuilding,
            Some(ContainerState::Disposed) => ScopeState::Disposed,
        }
    }

    /// Containers that finished initializing.
    pub fn containers(&self) -> Vec<Arc<ServiceContainer>> {
        self.containers
            .lock()
            .values()
            .filter_map(|cell| cell.get().cloned())
            .collect()
    }

    /// Disposes every container and forgets all scopes.
    pub fn dispose_all(&self) {
        let cells: Vec<_> = self.containers.lock().drain().map(|(_, cell)| cell).collect();
        let mut disposed = 0;
        for container in cells.iter().filter_map(|cell| cell.get()) {
            container.dispose();
            disposed += 1;
        }
        info!(disposed, "disposed all checking services");
    }

    async fn create_container(&self, id: ScopeId, fallback_root: Utf8PathBuf) -> Arc<ServiceContainer> {
        let scope = match self.context.discovery.load(&id, &fallback_root).await {
            Ok(scope) => scope,
            Err(err) => {
                warn!(scope = %id, error = %err, "failed to load configuration, using defaults");
                ConfigurationScope::fallback(id, fallback_root)
            }
        };
        let factory = SnapshotFactory::new(
            Arc::clone(&self.context.parser),
            Arc::clone(&self.context.documents),
        );
        Arc::new(ServiceContainer::new(
            scope,
            factory,
            Arc::clone(&self.context.fs),
            Arc::clone(&self.context.engine),
        ))
    }

    /// The root for files outside any configured project: the innermost
    /// workspace root containing `path`, else its directory.
    fn fallback_root(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.workspace_roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.as_str().len())
            .cloned()
            .or_else(|| path.parent().map(Utf8Path::to_path_buf))
            .unwrap_or_default()
    }
}
