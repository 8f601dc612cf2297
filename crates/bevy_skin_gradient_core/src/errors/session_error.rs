use thiserror::Error;

use crate::id::JointId;

/// Live-blend session failures. All of these are detected before the session
/// mutates anything, so a failed call leaves the weight table untouched.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Joint {0:?} is not a registered influence of the skin deformer")]
    NotInfluencing(JointId),
    #[error("A live blend session is already active for this mesh")]
    SessionAlreadyActive,
    #[error("No live blend session is active")]
    NoActiveSession,
    #[error("Live blending needs two distinct joints, got {0:?} twice")]
    IdenticalJoints(JointId),
    #[error("Islands of {joint_a:?} and {joint_b:?} never touch: nothing to ease")]
    EmptyBlendRegion { joint_a: JointId, joint_b: JointId },
}
