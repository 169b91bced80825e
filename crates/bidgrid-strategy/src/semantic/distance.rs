//! Distance-delay throttling.
//!
//! Spreads bids over a large network without coordination. Node and job ids
//! are hashed onto the same 32-bit ring; the hash space is cut into chunks
//! sized so that on average `concurrency` nodes share a chunk with the job.
//! A node waits one second per chunk of distance before bidding, and drops
//! the offer outright once that wait would exceed `MAX_DELAY`.
//!
//! Close nodes bid at once. Far nodes wait, and by then have usually seen
//! enough bids from others to skip the job.
//!
//! This is the only strategy that deliberately suspends. The sleep is a
//! plain `tokio::time::sleep`, so dropping the evaluation future (e.g. an
//! outer `tokio::time::timeout`) cancels it.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{BidError, BidResult};
use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy};

/// Longest a node will hold an offer before bidding.
pub const MAX_DELAY: Duration = Duration::from_millis(1000);

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a.
pub fn fnv1a_32(s: &str) -> u32 {
    s.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// The computed placement of a node relative to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceDelay {
    pub node_hash: u32,
    pub job_hash: u32,
    pub distance: u64,
    pub chunk: u64,
    pub delay: Duration,
}

impl DistanceDelay {
    /// Compute the delay for `node_id` bidding on `job_id`.
    ///
    /// `concurrency` is clamped to at least one. When it covers the whole
    /// network every node is in the active set and the delay is zero.
    pub fn compute(node_id: &str, job_id: &str, concurrency: u32, network_size: u32) -> Self {
        let node_hash = fnv1a_32(node_id);
        let job_hash = fnv1a_32(job_id);
        let distance = u64::from(node_hash.abs_diff(job_hash));

        let concurrency = concurrency.max(1);
        let network_size = network_size.max(1);
        let full_ring = u64::from(u32::MAX);

        let (chunk, delay_ms) = if concurrency >= network_size {
            (full_ring, 0)
        } else {
            let fraction = f64::from(concurrency) / f64::from(network_size);
            let chunk = ((fraction * full_ring as f64) as u64).max(1);
            (chunk, (distance / chunk).saturating_mul(1000))
        };

        Self {
            node_hash,
            job_hash,
            distance,
            chunk,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Too far from the job to bid at all.
    pub fn too_far(&self) -> bool {
        self.delay > MAX_DELAY
    }
}

/// Delays or drops offers according to the node's hash distance from the job.
#[derive(Debug, Clone, Copy)]
pub struct DistanceDelayStrategy {
    network_size: u32,
}

impl DistanceDelayStrategy {
    /// `network_size` is the estimated number of nodes in the network.
    pub fn new(network_size: u32) -> BidResult<Self> {
        if network_size == 0 {
            return Err(BidError::Config(
                "distance-delay network size must be at least 1".to_string(),
            ));
        }
        Ok(Self { network_size })
    }
}

impl SemanticStrategy for DistanceDelayStrategy {
    fn name(&self) -> &str {
        "distance-delay"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            let job = &request.job;
            let placement = DistanceDelay::compute(
                &request.node_id,
                &job.id,
                job.bid_concurrency(),
                self.network_size,
            );
            trace!(
                node_id = %request.node_id,
                job_id = %job.id,
                node_hash = placement.node_hash,
                job_hash = placement.job_hash,
                distance = placement.distance,
                chunk = placement.chunk,
                delay_ms = placement.delay.as_millis() as u64,
                "computed job/node distance"
            );

            if placement.too_far() {
                warn!(
                    node_id = %request.node_id,
                    job_id = %job.id,
                    distance = placement.distance,
                    chunk = placement.chunk,
                    delay_ms = placement.delay.as_millis() as u64,
                    "dropped job: node too far from job"
                );
                return Ok(BidResponse::reject(format!(
                    "node is too far from job {} (delay {:?} exceeds {:?})",
                    job.id, placement.delay, MAX_DELAY
                )));
            }

            if !placement.delay.is_zero() {
                debug!(
                    job_id = %job.id,
                    delay_ms = placement.delay.as_millis() as u64,
                    "waiting before bidding on job"
                );
                tokio::time::sleep(placement.delay).await;
            }

            Ok(BidResponse::accept(format!(
                "node is within bidding distance of job {} (delayed {:?})",
                job.id, placement.delay
            )))
        })
    }
}
