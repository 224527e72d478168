//! The seam to the external type-checking engine.
//!
//! Everything the engine reports is in projected coordinates. Service
//! containers translate results back to original file positions.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use source_map::{ByteOffset, LineCol, Span};

use crate::config::CompilerSettings;
use crate::overlay::ResolutionOverlay;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

/// A diagnostic from the engine, in projected coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDiagnostic {
    pub span: Span,
    pub message: String,
    /// The engine's error code, e.g. 2322.
    pub code: Option<u32>,
    pub severity: Severity,
}

/// A diagnostic translated back to the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedDiagnostic {
    pub file: Utf8PathBuf,
    pub span: Span,
    pub start: LineCol,
    pub end: LineCol,
    pub message: String,
    pub code: Option<u32>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    /// The range the completion replaces, if the engine reports one.
    pub replace: Option<Span>,
}

/// A definition site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLocation {
    pub path: Utf8PathBuf,
    pub span: Span,
}

/// Creates checking sessions.
pub trait CheckingEngine: Send + Sync {
    /// Starts a session that reads every file through `host`.
    fn create_session(
        &self,
        host: Arc<ResolutionOverlay>,
        settings: &CompilerSettings,
    ) -> Arc<dyn CheckingSession>;
}

/// One live engine instance for one project.
pub trait CheckingSession: Send + Sync {
    fn diagnostics(&self, path: &Utf8Path) -> Vec<CheckDiagnostic>;

    fn completions(&self, path: &Utf8Path, offset: ByteOffset) -> Vec<Completion>;

    fn definition(&self, path: &Utf8Path, offset: ByteOffset) -> Vec<SymbolLocation>;

    /// Drops anything the session cached for `path`.
    fn forget(&self, path: &Utf8Path);

    /// Releases the session. It is not used afterwards.
    fn dispose(&self);
}
