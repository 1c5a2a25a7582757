//! Errors raised while evaluating definitions against a host.

use crate::condition::ConditionError;
use crate::interpolation::InterpolationError;

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// A collection target referenced a missing fact.
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    /// A definition carried an invalid condition.
    #[error(transparent)]
    Condition(#[from] ConditionError),
}
