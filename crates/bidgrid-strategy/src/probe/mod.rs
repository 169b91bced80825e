//! Probe strategies hand the decision to an operator-supplied program.
//!
//! Both probes send the same JSON document:
//!
//! ```json
//! { "nodeId": "...", "jobId": "...", "job": { ... }, "callback": "..." }
//! ```
//!
//! A probe that answers "no" is a rejection. A probe that cannot be run,
//! reached, or understood is an error, so callers can tell the two apart.

pub mod exec;
pub mod http;

pub use self::exec::{
    ExternalCommandStrategy, ExternalCommandStrategyParams, MAX_STDERR_REASON_BYTES,
};
pub use self::http::{ExternalHttpStrategy, ExternalHttpStrategyParams};

use serde::Serialize;

use bidgrid_core::Job;

use crate::error::{BidError, BidResult};
use crate::model::BidRequest;

/// Environment variable carrying the probe document for subprocess probes.
pub const PROBE_DATA_ENV: &str = "BIDGRID_JOB_SELECTION_PROBE_DATA";

/// Largest probe document passed to a subprocess. Kept under the kernel's
/// per-string limit for environment variables.
pub const MAX_EXEC_PROBE_DATA_BYTES: usize = 100 * 1024;

/// Wire form of a `BidRequest` as seen by probes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeData<'a> {
    pub node_id: &'a str,
    pub job_id: &'a str,
    pub job: &'a Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<&'a str>,
}

impl<'a> From<&'a BidRequest> for ProbeData<'a> {
    fn from(request: &'a BidRequest) -> Self {
        Self {
            node_id: &request.node_id,
            job_id: &request.job.id,
            job: &request.job,
            callback: request.callback.as_deref(),
        }
    }
}

/// Serialize `request` for a probe, failing when the document exceeds
/// `limit` bytes.
pub fn probe_payload(request: &BidRequest, limit: Option<usize>) -> BidResult<String> {
    let payload =
        serde_json::to_string(&ProbeData::from(request)).map_err(BidError::Serialize)?;
    if let Some(limit) = limit {
        if payload.len() > limit {
            return Err(BidError::RequestTooLarge {
                size: payload.len(),
                limit,
            });
        }
    }
    Ok(payload)
}
