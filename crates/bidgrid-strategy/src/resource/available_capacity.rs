//! Capacity currently free on the node.

use std::sync::Arc;

use bidgrid_core::ResourceUsage;

use crate::capacity::CapacityTracker;
use crate::model::{BidFuture, BidRequest, BidResponse, ResourceStrategy, decided};

pub struct AvailableCapacityStrategyParams {
    pub running: Arc<dyn CapacityTracker>,
    pub enqueued: Arc<dyn CapacityTracker>,
}

/// Rejects jobs that exceed what the running and enqueued pools have free
/// between them.
pub struct AvailableCapacityStrategy {
    running: Arc<dyn CapacityTracker>,
    enqueued: Arc<dyn CapacityTracker>,
}

impl AvailableCapacityStrategy {
    pub fn new(params: AvailableCapacityStrategyParams) -> Self {
        Self {
            running: params.running,
            enqueued: params.enqueued,
        }
    }
}

impl ResourceStrategy for AvailableCapacityStrategy {
    fn name(&self) -> &str {
        "available-capacity"
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        _request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        let available = self
            .running
            .available_capacity()
            .add(&self.enqueued.available_capacity());

        let resp = if usage.less_than_eq(&available) {
            BidResponse::proceed()
        } else {
            BidResponse::reject(format!(
                "job requires {usage}, which exceeds the available capacity {available}"
            ))
        };
        decided(Ok(resp))
    }
}

#[cfg(test)]
mod tests {
    use bidgrid_core::Job;

    use super::*;
    use crate::capacity::LocalCapacityTracker;

    fn strategy(running: ResourceUsage, enqueued: ResourceUsage) -> AvailableCapacityStrategy {
        AvailableCapacityStrategy::new(AvailableCapacityStrategyParams {
            running: Arc::new(LocalCapacityTracker::new(running)),
            enqueued: Arc::new(LocalCapacityTracker::new(enqueued)),
        })
    }

    fn request() -> BidRequest {
        BidRequest::new("node-1", Job::default())
    }

    #[tokio::test]
    async fn usage_equal_to_available_is_accepted() {
        let s = strategy(
            ResourceUsage::new(2.0, 1024, 0, 0),
            ResourceUsage::new(1.0, 1024, 0, 0),
        );
        let usage = ResourceUsage::new(3.0, 2048, 0, 0);

        let resp = s.should_bid_based_on_usage(&request(), &usage).await.unwrap();

        assert!(resp.should_bid);
    }

    #[tokio::test]
    async fn usage_over_combined_capacity_is_rejected() {
        let s = strategy(
            ResourceUsage::new(2.0, 1024, 0, 0),
            ResourceUsage::new(1.0, 1024, 0, 0),
        );
        let usage = ResourceUsage::new(3.0, 2049, 0, 0);

        let resp = s.should_bid_based_on_usage(&request(), &usage).await.unwrap();

        assert!(!resp.should_bid);
        assert!(resp.reason.contains("exceeds the available capacity"));
    }

    #[tokio::test]
    async fn reads_tracker_at_evaluation_time() {
        let running = Arc::new(LocalCapacityTracker::new(ResourceUsage::new(1.0, 0, 0, 0)));
        let s = AvailableCapacityStrategy::new(AvailableCapacityStrategyParams {
            running: running.clone(),
            enqueued: Arc::new(LocalCapacityTracker::default()),
        });
        let usage = ResourceUsage::new(1.0, 0, 0, 0);

        assert!(s.should_bid_based_on_usage(&request(), &usage).await.unwrap().should_bid);
        running.set_available(ResourceUsage::new(0.5, 0, 0, 0));
        assert!(!s.should_bid_based_on_usage(&request(), &usage).await.unwrap().should_bid);
    }
}
