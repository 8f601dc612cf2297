use thiserror::Error;

use crate::id::JointId;

/// Precondition failures of gradient distribution. Raised before any weight
/// is mutated; soft per-pair conditions are reported as warnings instead.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradientError {
    #[error("{end:?} is not a descendant of {start:?}: no parent->child chain between them")]
    InvalidChain { start: JointId, end: JointId },
    #[error("A joint chain needs at least two joints")]
    ChainTooShort,
}
