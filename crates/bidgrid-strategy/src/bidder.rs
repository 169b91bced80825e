//! Two-phase bidder.
//!
//! ```text
//! BidRequest ──► semantic chain ──reject──► BidOutcome { usage: None }
//!                      │
//!                    bid (maybe wait)
//!                      ▼
//!               usage calculator ──► resource chain ──► BidOutcome { usage }
//! ```
//!
//! Resource usage is only estimated for jobs the node is willing to run at
//! all, so a cheap semantic rejection never pays for an estimate.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use bidgrid_core::ResourceUsage;

use crate::capacity::UsageCalculator;
use crate::error::{BidError, BidResult};
use crate::model::{BidRequest, BidResponse, ResourceStrategy, SemanticStrategy};

pub struct BidderParams {
    pub semantic: Box<dyn SemanticStrategy>,
    pub resource: Box<dyn ResourceStrategy>,
    pub usage_calculator: Arc<dyn UsageCalculator>,
}

/// Final verdict on an offer, plus the usage estimate when one was made.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidOutcome {
    pub response: BidResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResourceUsage>,
}

pub struct Bidder {
    semantic: Box<dyn SemanticStrategy>,
    resource: Box<dyn ResourceStrategy>,
    usage_calculator: Arc<dyn UsageCalculator>,
}

impl Bidder {
    pub fn new(params: BidderParams) -> Self {
        Self {
            semantic: params.semantic,
            resource: params.resource,
            usage_calculator: params.usage_calculator,
        }
    }

    /// Evaluate one offer.
    ///
    /// A semantic "bid but wait" still runs the resource phase; the hold is
    /// carried into the final response.
    pub async fn run_bidding(&self, request: &BidRequest) -> BidResult<BidOutcome> {
        let job_id = request.job.id.as_str();

        let semantic = self.semantic.should_bid(request).await?;
        if !semantic.should_bid {
            info!(
                job_id,
                node_id = %request.node_id,
                should_wait = semantic.should_wait,
                reason = %semantic.reason,
                "declining job on semantic checks"
            );
            return Ok(BidOutcome {
                response: semantic,
                usage: None,
            });
        }

        let usage = self.usage_calculator.calculate(request).await?;
        debug!(job_id, %usage, "estimated job usage");

        let mut response = self.resource.should_bid_based_on_usage(request, &usage).await?;
        if semantic.should_wait {
            response.should_wait = true;
            if response.reason.is_empty() {
                response.reason = semantic.reason;
            }
        }

        info!(
            job_id,
            node_id = %request.node_id,
            should_bid = response.should_bid,
            should_wait = response.should_wait,
            reason = %response.reason,
            "bid decision reached"
        );
        Ok(BidOutcome {
            response,
            usage: Some(usage),
        })
    }

    /// `run_bidding` bounded by `deadline`. Expiry drops the evaluation,
    /// which cancels any delay or probe still in flight.
    pub async fn run_bidding_within(
        &self,
        request: &BidRequest,
        deadline: Duration,
    ) -> BidResult<BidOutcome> {
        tokio::time::timeout(deadline, self.run_bidding(request))
            .await
            .map_err(|_| BidError::DeadlineExceeded {
                job_id: request.job.id.clone(),
                deadline,
            })?
    }
}
