//! Filesystem definition loader.
//!
//! Scans the definitions directory for YAML files and loads every artifact
//! and check they contain into in-memory maps keyed by id. A file may hold
//! several definitions as separate YAML documents (`---`).
//! All kinds go through two-pass deserialization (DefinitionEnvelope -> Definition).

mod core;
mod error;


pub use self::core::DefinitionLoader;
pub use self::error::{DefinitionError, LoadResult, LoadStatus, Result};
