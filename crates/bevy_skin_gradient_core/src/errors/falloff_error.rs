use thiserror::Error;

/// Invalid falloff profile data.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FalloffError {
    #[error("Falloff steps must strictly decrease within (0, 1], got {steps:?}")]
    NonMonotonic { steps: Vec<f32> },
    #[error("A falloff profile needs at least one step")]
    Empty,
}

/// Errors produced while loading a `.falloff.ron` preset library.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FalloffLoaderError {
    #[error("Could not read falloff library: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse falloff library RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error(transparent)]
    Profile(#[from] FalloffError),
}
