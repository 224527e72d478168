//! Immutable, versioned projections.

use camino::{Utf8Path, Utf8PathBuf};
use source_map::{ByteOffset, LineCol, LineIndex, PositionMap, Span};
use text_size::TextSize;

use crate::builder::Projection;
use crate::directives::DegradedDirective;
use crate::script::Declaration;
use crate::types::ScriptKind;

/// Where a snapshot's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// An open editor buffer; takes precedence over disk contents.
    Editor,
    /// Read from disk on demand.
    Disk,
}

/// One version of one file as the checker sees it.
///
/// Snapshots never change after construction. Share them as `Arc<Snapshot>`
/// and replace the whole value when the file changes.
#[derive(Debug)]
pub struct Snapshot {
    path: Utf8PathBuf,
    version: i32,
    original: String,
    projected: String,
    map: PositionMap,
    script_kind: ScriptKind,
    declarations: Vec<Declaration>,
    degraded: Vec<DegradedDirective>,
    origin: SnapshotOrigin,
    original_lines: LineIndex,
    projected_lines: LineIndex,
}

impl Snapshot {
    /// Wraps the projection of a component file.
    pub fn component(
        path: Utf8PathBuf,
        version: i32,
        original: String,
        projection: Projection,
        origin: SnapshotOrigin,
    ) -> Self {
        Self {
            original_lines: LineIndex::new(&original),
            projected_lines: LineIndex::new(&projection.text),
            path,
            version,
            original,
            projected: projection.text,
            map: projection.map,
            script_kind: projection.script_kind,
            declarations: projection.declarations,
            degraded: projection.degraded,
            origin,
        }
    }

    /// Wraps a plain script file, which the checker reads as is.
    pub fn script(path: Utf8PathBuf, version: i32, text: String, origin: SnapshotOrigin) -> Self {
        let lines = LineIndex::new(&text);
        Self {
            script_kind: ScriptKind::from_path(&path),
            map: PositionMap::identity(TextSize::from(text.len() as u32)),
            projected: text.clone(),
            original_lines: lines.clone(),
            projected_lines: lines,
            path,
            version,
            original: text,
            declarations: Vec::new(),
            degraded: Vec::new(),
            origin,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// The text handed to the checker.
    pub fn projected_text(&self) -> &str {
        &self.projected
    }

    pub fn map(&self) -> &PositionMap {
        &self.map
    }

    pub fn script_kind(&self) -> ScriptKind {
        self.script_kind
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn degraded(&self) -> &[DegradedDirective] {
        &self.degraded
    }

    /// Returns true if some directives lost their type information.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    /// Maps a projected range to the original, `None` for synthetic text.
    pub fn original_span(&self, projected: Span) -> Option<Span> {
        self.map.original_span(projected)
    }

    pub fn projected_offset(&self, original: ByteOffset) -> Option<ByteOffset> {
        self.map.generated_position(original)
    }

    pub fn original_line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        self.original_lines.line_col(offset)
    }

    pub fn projected_line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        self.projected_lines.line_col(offset)
    }
}
