//! Stateless-job rejection.

use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy, decided};

#[derive(Debug, Clone, Copy, Default)]
pub struct StatelessJobStrategyParams {
    pub reject_stateless_jobs: bool,
}

/// Optionally rejects jobs that declare no input data.
#[derive(Debug, Clone, Copy)]
pub struct StatelessJobStrategy {
    reject_stateless_jobs: bool,
}

impl StatelessJobStrategy {
    pub fn new(params: StatelessJobStrategyParams) -> Self {
        Self {
            reject_stateless_jobs: params.reject_stateless_jobs,
        }
    }
}

impl SemanticStrategy for StatelessJobStrategy {
    fn name(&self) -> &str {
        "stateless-job"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        let resp = if self.reject_stateless_jobs && request.job.is_stateless() {
            BidResponse::reject("this node rejects jobs that declare no input data")
        } else {
            BidResponse::proceed()
        };
        decided(Ok(resp))
    }
}
