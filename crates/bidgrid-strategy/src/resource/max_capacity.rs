//! Fixed per-job ceiling.

use bidgrid_core::ResourceUsage;

use crate::model::{BidFuture, BidRequest, BidResponse, ResourceStrategy, decided};

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxCapacityStrategyParams {
    pub max_job_requirements: ResourceUsage,
}

/// Rejects any single job larger than the configured ceiling, regardless of
/// current load.
#[derive(Debug, Clone, Copy)]
pub struct MaxCapacityStrategy {
    max_job_requirements: ResourceUsage,
}

impl MaxCapacityStrategy {
    pub fn new(params: MaxCapacityStrategyParams) -> Self {
        Self {
            max_job_requirements: params.max_job_requirements,
        }
    }
}

impl ResourceStrategy for MaxCapacityStrategy {
    fn name(&self) -> &str {
        "max-capacity"
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        _request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        let max = &self.max_job_requirements;
        let resp = if usage.less_than_eq(max) {
            BidResponse::proceed()
        } else {
            BidResponse::reject(format!(
                "job requires {usage}, which exceeds the per-job limit {max}"
            ))
        };
        decided(Ok(resp))
    }
}
