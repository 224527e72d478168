//! Documents and the collaborators that produce them.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use svelte_projection::markup::MarkupDocument;

use crate::fs::FileSystem;

/// The text of one file at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: Utf8PathBuf,
    pub text: String,
    /// Editor versions increase monotonically. Files read from disk are version 0.
    pub version: i32,
}

impl Document {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>, version: i32) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            version,
        }
    }
}

/// Produces documents for paths that no editor has open.
pub trait DocumentFactory: Send + Sync {
    fn open(&self, path: &Utf8Path) -> Option<Document>;
}

/// Reads documents through a [`FileSystem`].
#[derive(Clone)]
pub struct FsDocumentFactory {
    fs: Arc<dyn FileSystem>,
}

impl FsDocumentFactory {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl DocumentFactory for FsDocumentFactory {
    fn open(&self, path: &Utf8Path) -> Option<Document> {
        let text = self.fs.read_file(path)?;
        Some(Document::new(path, text, 0))
    }
}

/// Parses component markup into the tree the projection builder consumes.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, path: &Utf8Path, text: &str) -> Result<MarkupDocument, String>;
}
