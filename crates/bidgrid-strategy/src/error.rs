//! Bid strategy error types.
//!
//! An error means the engine could not reach a decision. Policy rejections
//! are never errors; they surface as `BidResponse { should_bid: false, .. }`.

use std::time::Duration;

use thiserror::Error;

/// Errors that abort a bid evaluation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("invalid strategy configuration: {0}")]
    Config(String),

    #[error(transparent)]
    NodeConfig(#[from] bidgrid_core::ConfigError),

    #[error("failed to serialize bid request: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("bid request is {size} bytes, over the {limit} byte probe limit")]
    RequestTooLarge { size: usize, limit: usize },

    #[error("failed to run probe command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe command `{command}` i/o error: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe `{target}` timed out after {timeout:?}")]
    ProbeTimeout { target: String, timeout: Duration },

    #[error("probe transport error for `{target}`: {message}")]
    Transport { target: String, message: String },

    #[error("probe response from `{target}` exceeds {limit} bytes")]
    ResponseTooLarge { target: String, limit: usize },

    #[error("invalid probe response from `{target}`: {source}")]
    InvalidResponse {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage locality check failed: {0}")]
    Storage(String),

    #[error("resource usage calculation failed: {0}")]
    Usage(String),

    #[error("bid evaluation for job {job_id} exceeded its {deadline:?} deadline")]
    DeadlineExceeded { job_id: String, deadline: Duration },
}

pub type BidResult<T> = Result<T, BidError>;
