//! Error types for checking services.

use camino::Utf8PathBuf;
use svelte_projection::ProjectionError;
use thiserror::Error;

use crate::config::ScopeId;

/// Errors surfaced by a service container.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Neither the editor nor the disk has the file.
    #[error("file not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The markup parser rejected the component.
    #[error("failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    /// The projection builder failed.
    #[error("failed to project {path}: {source}")]
    Projection {
        path: Utf8PathBuf,
        #[source]
        source: ProjectionError,
    },

    /// The container was disposed and must not be used.
    #[error("service for {0} has been disposed")]
    Disposed(ScopeId),
}

/// Errors while loading a project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to enumerate project files: {0}")]
    Walk(String),
}
