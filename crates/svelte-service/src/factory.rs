//! Turns documents into snapshots.

use std::sync::Arc;

use camino::Utf8Path;
use svelte_projection::{is_component_path, project, ProjectionOptions, Snapshot, SnapshotOrigin};
use tracing::debug;

use crate::document::{Document, DocumentFactory, MarkupParser};
use crate::error::ServiceError;

/// Builds snapshots, projecting component files on the way.
#[derive(Clone)]
pub struct SnapshotFactory {
    parser: Arc<dyn MarkupParser>,
    documents: Arc<dyn DocumentFactory>,
}

impl SnapshotFactory {
    pub fn new(parser: Arc<dyn MarkupParser>, documents: Arc<dyn DocumentFactory>) -> Self {
        Self { parser, documents }
    }

    /// Reads a document no editor has open.
    pub fn open(&self, path: &Utf8Path) -> Option<Document> {
        self.documents.open(path)
    }

    pub fn build(&self, document: Document, origin: SnapshotOrigin) -> Result<Snapshot, ServiceError> {
        let Document {
            path,
            text,
            version,
        } = document;
        if !is_component_path(&path) {
            return Ok(Snapshot::script(path, version, text, origin));
        }

        let markup = self
            .parser
            .parse(&path, &text)
            .map_err(|message| ServiceError::Parse {
                path: path.clone(),
                message,
            })?;
        let options = ProjectionOptions {
            filename: Some(path.clone()),
        };
        let projection =
            project(&text, &markup, &options).map_err(|source| ServiceError::Projection {
                path: path.clone(),
                source,
            })?;
        if !projection.degraded.is_empty() {
            debug!(
                path = %path,
                degraded = projection.degraded.len(),
                "some directives were projected without type information"
            );
        }
        Ok(Snapshot::component(path, version, text, projection, origin))
    }
}
