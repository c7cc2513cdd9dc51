//! Error types for the simulation core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur in the simulation core.
///
/// Only configuration-level preconditions produce errors; degraded per-frame
/// input (missing speaker, sparse keypoints) is absorbed into defaults and
/// never surfaces here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no usable sessions found in {0:?}; run the frame extraction pipeline first")]
    NoSessionsFound(Vec<PathBuf>),

    #[error("session pool is empty")]
    EmptySessionPool,

    #[error("canvas initialization requires {0} on a detection with a person")]
    MissingGeometry(&'static str),

    #[error("no expert transitions could be derived; sessions need ideal_crop labels")]
    NoExpertPairs,

    #[error("step called before reset")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
