//! Checking services for Svelte projects.
//!
//! A [`ServiceRegistry`] maps every file to the project that governs it and
//! owns one [`ServiceContainer`] per project. A container keeps the project's
//! [`Snapshot`](svelte_projection::Snapshot)s, a [`ResolutionOverlay`] that
//! the checking engine reads files through, and one live checking session.
//!
//! # Example
//!
//! ```ignore
//! use svelte_service::{Document, ServiceRegistry};
//!
//! let registry = ServiceRegistry::new(context, vec![workspace_root]);
//! registry.update_snapshot(Document::new(path, text, 1)).await?;
//! let diagnostics = registry.service_for(&path).await.diagnostics(&path)?;
//! ```

mod config;
mod container;
mod document;
mod engine;
mod error;
mod factory;
mod fs;
mod manager;
mod overlay;
mod registry;
pub mod shims;

pub use config::{
    CompilerSettings, ConfigDiscovery, ConfigurationScope, FsConfigDiscovery, ScopeId,
};
pub use container::{ContainerState, FileChangeKind, ServiceContainer, SnapshotInput};
pub use document::{Document, DocumentFactory, FsDocumentFactory, MarkupParser};
pub use engine::{
    CheckDiagnostic, CheckingEngine, CheckingSession, Completion, MappedDiagnostic, Severity,
    SymbolLocation,
};
pub use error::{ConfigError, ServiceError};
pub use factory::SnapshotFactory;
pub use fs::{FileSystem, OsFileSystem};
pub use manager::SnapshotManager;
pub use overlay::ResolutionOverlay;
pub use registry::{ScopeState, ServiceContext, ServiceRegistry};
