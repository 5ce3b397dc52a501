//! Configuration errors.
//!
//! Only parameters coming from the outside are reported as errors. Broken
//! caller contracts (empty planes, undersized buffers, passes run out of
//! order) are assertions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrainError {
    #[error("sigma must be in [0, 1], got {0}")]
    InvalidSigma(f32),

    #[error("resolution (kernel point count) must be > 0, got {0}")]
    InvalidResolution(i32),

    #[error("grain radius must be > 0, got {0}")]
    InvalidRadius(f32),

    #[error("grain radius deviation must be in [0, 1], got {0}")]
    InvalidDeviation(f32),

    #[error("invalid parameter JSON: {0}")]
    Config(#[from] serde_json::Error),
}
