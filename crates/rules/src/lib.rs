//! Knowledge-base driven collection definitions.
//!
//! This crate provides:
//! - `%%attribute%%` interpolation against a knowledge base, with fan-out over
//!   repeated user records
//! - Windows `%VAR%` environment expansion
//! - A swappable condition language for host applicability tests
//! - YAML artifact and check definitions, loaded from a directory tree
//! - Collection planning: which artifacts a host needs and where they live

pub mod condition;
pub mod environ;
pub mod error;
pub mod interpolation;
pub mod loader;
pub mod planner;
pub mod schema;

pub use condition::{
    check_condition, compile_condition, ConditionError, ExpressionLanguage, Matcher,
};
pub use error::EvaluationError;
pub use interpolation::{
    interpolate_kb_attributes, interpolate_list_kb_attributes, Interpolation, InterpolationError,
};
pub use loader::DefinitionLoader;
pub use planner::{plan_collection, CollectionPlan};
