//! Execution-timeout bounds.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::{BidError, BidResult};
use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy, decided};

#[derive(Debug, Clone, Default)]
pub struct TimeoutStrategyParams {
    pub min_job_execution_timeout: Duration,
    /// `None` means no upper bound.
    pub max_job_execution_timeout: Option<Duration>,
    /// Namespaces exempt from both bounds.
    pub bypass_namespaces: HashSet<String>,
}

/// Rejects jobs whose declared timeout falls outside the node's bounds.
///
/// Jobs that declare no timeout, and jobs owned by a bypass namespace,
/// are always accepted.
#[derive(Debug, Clone)]
pub struct TimeoutStrategy {
    min: Duration,
    max: Option<Duration>,
    bypass: HashSet<String>,
}

impl TimeoutStrategy {
    pub fn new(params: TimeoutStrategyParams) -> BidResult<Self> {
        if let Some(max) = params.max_job_execution_timeout {
            if params.min_job_execution_timeout > max {
                return Err(BidError::Config(format!(
                    "minimum job timeout {:?} exceeds maximum {:?}",
                    params.min_job_execution_timeout, max
                )));
            }
        }
        Ok(Self {
            min: params.min_job_execution_timeout,
            max: params.max_job_execution_timeout,
            bypass: params.bypass_namespaces,
        })
    }

    fn evaluate(&self, request: &BidRequest) -> BidResponse {
        let Some(timeout) = request.job.timeout() else {
            return BidResponse::accept("job declares no execution timeout");
        };

        let namespace = &request.job.namespace;
        if !namespace.is_empty() && self.bypass.contains(namespace) {
            return BidResponse::accept(format!(
                "namespace `{namespace}` bypasses job timeout bounds"
            ));
        }

        if timeout < self.min {
            return BidResponse::reject(format!(
                "job timeout {timeout:?} is below the minimum allowed {:?}",
                self.min
            ));
        }
        if let Some(max) = self.max {
            if timeout > max {
                return BidResponse::reject(format!(
                    "job timeout {timeout:?} exceeds the maximum allowed {max:?}"
                ));
            }
        }

        BidResponse::accept(format!("job timeout {timeout:?} is within bounds"))
    }
}

impl SemanticStrategy for TimeoutStrategy {
    fn name(&self) -> &str {
        "timeout"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        decided(Ok(self.evaluate(request)))
    }
}
