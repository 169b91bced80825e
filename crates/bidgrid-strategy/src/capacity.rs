//! Capacity collaborators: trackers of available capacity and job usage
//! estimators.
//!
//! Trackers are owned outside the engine and read concurrently by every
//! in-flight evaluation; implementations synchronise internally.

use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use bidgrid_core::ResourceUsage;

use crate::error::BidResult;
use crate::model::BidRequest;

/// Reports how much capacity is currently free in one pool.
pub trait CapacityTracker: Send + Sync {
    fn available_capacity(&self) -> ResourceUsage;
}

/// In-memory tracker whose value is pushed by its owner.
#[derive(Debug, Default)]
pub struct LocalCapacityTracker {
    available: RwLock<ResourceUsage>,
}

impl LocalCapacityTracker {
    pub fn new(available: ResourceUsage) -> Self {
        Self {
            available: RwLock::new(available),
        }
    }

    pub fn set_available(&self, available: ResourceUsage) {
        let mut guard = self.available.write().unwrap_or_else(|e| e.into_inner());
        *guard = available;
    }
}

impl CapacityTracker for LocalCapacityTracker {
    fn available_capacity(&self) -> ResourceUsage {
        *self.available.read().unwrap_or_else(|e| e.into_inner())
    }
}

pub type UsageFuture<'a> = Pin<Box<dyn Future<Output = BidResult<ResourceUsage>> + Send + 'a>>;

/// Estimates the resources a job will consume on this node.
pub trait UsageCalculator: Send + Sync {
    fn calculate<'a>(&'a self, request: &'a BidRequest) -> UsageFuture<'a>;
}

/// Takes the job's declared resources, filling undeclared fields from
/// node defaults.
#[derive(Debug, Clone, Default)]
pub struct DeclaredUsageCalculator {
    defaults: ResourceUsage,
}

impl DeclaredUsageCalculator {
    pub fn new(defaults: ResourceUsage) -> Self {
        Self { defaults }
    }
}

impl UsageCalculator for DeclaredUsageCalculator {
    fn calculate<'a>(&'a self, request: &'a BidRequest) -> UsageFuture<'a> {
        let usage = request.job.task.resources.or_defaults(&self.defaults);
        Box::pin(std::future::ready(Ok(usage)))
    }
}
