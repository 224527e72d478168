//! Error types for projection.

use crate::markup::DirectiveKind;
use source_map::{BufferError, Span};
use thiserror::Error;

/// A projection that could not be built.
///
/// Every variant is a bug in the projection rules rather than bad input:
/// malformed markup degrades instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("{kind:?} directive at {span:?} produced an invalid edit: {source}")]
    Directive {
        kind: DirectiveKind,
        span: Span,
        #[source]
        source: BufferError,
    },

    #[error("invalid edit while projecting {phase}: {source}")]
    Layout {
        phase: &'static str,
        #[source]
        source: BufferError,
    },
}

impl ProjectionError {
    pub(crate) fn layout(phase: &'static str) -> impl FnOnce(BufferError) -> Self {
        move |source| Self::Layout { phase, source }
    }
}
