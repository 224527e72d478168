//! Svelte component projection.
//!
//! Turns a parsed component into TSX that a TypeScript checker can analyze,
//! together with a position map back to the component source. The pipeline:
//! - script contents pass through at module level with light rewriting
//! - each directive attribute is rewritten by its [`directives::rule_for`] rule
//! - markup regions are wrapped in arrow functions returning fragments
//!
//! # Example
//!
//! ```ignore
//! use svelte_projection::{project, ProjectionOptions};
//!
//! let document = parser.parse(path, source)?;
//! let projection = project(source, &document, &ProjectionOptions::default())?;
//! println!("TSX output:\n{}", projection.text);
//! ```

mod builder;
pub mod directives;
mod error;
pub mod markup;
mod script;
mod snapshot;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use builder::{project, Projection, ProjectionOptions};
pub use directives::DegradedDirective;
pub use error::ProjectionError;
pub use script::{Declaration, DeclarationKind};
pub use snapshot::{Snapshot, SnapshotOrigin};
pub use types::{component_name_from_path, is_component_path, ScriptKind};
