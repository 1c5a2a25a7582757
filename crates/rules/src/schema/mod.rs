//! YAML definition types with serde deserialization.
//!
//! Defines the document hierarchy for collection definitions:
//! - `DefinitionEnvelope`: lightweight first-pass header (kind)
//! - `Definition`: enum dispatching to kind-specific types
//! - `ArtifactDefinition`: named collection recipe with templated paths
//! - `CheckDefinition`: host rule that wants one or more artifacts

mod applicability;
mod artifact;
mod check;
mod document;
mod envelope;
mod kind;

pub use applicability::*;
pub use artifact::*;
pub use check::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
