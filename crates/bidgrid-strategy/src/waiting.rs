//! Waiting decorator forces `should_wait` onto an inner verdict.
//!
//! Used to put whole classes of decisions behind a moderation hold. The
//! inner verdict (`should_bid`, `reason`) is passed through untouched;
//! only the wait flag is raised. Errors pass through unchanged.

use bidgrid_core::ResourceUsage;

use crate::model::{BidFuture, BidRequest, BidResponse, ResourceStrategy, SemanticStrategy};

const MODERATION_REASON: &str = "decision held for moderation";

#[derive(Debug, Clone, Copy, Default)]
pub struct WaitingStrategyParams {
    pub wait_on_bid: bool,
    pub wait_on_no_bid: bool,
}

pub struct WaitingStrategy<S> {
    inner: S,
    name: String,
    params: WaitingStrategyParams,
}

impl<S> WaitingStrategy<S> {
    pub fn new(inner: S, params: WaitingStrategyParams) -> Self {
        Self {
            inner,
            name: "waiting".to_string(),
            params,
        }
    }

    fn hold(&self, mut resp: BidResponse) -> BidResponse {
        let wait = if resp.should_bid {
            self.params.wait_on_bid
        } else {
            self.params.wait_on_no_bid
        };
        if wait {
            resp.should_wait = true;
            if resp.reason.is_empty() {
                resp.reason = MODERATION_REASON.to_string();
            }
        }
        resp
    }
}

impl<S: SemanticStrategy> SemanticStrategy for WaitingStrategy<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            let resp = self.inner.should_bid(request).await?;
            Ok(self.hold(resp))
        })
    }
}

impl<S: ResourceStrategy> ResourceStrategy for WaitingStrategy<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        Box::pin(async move {
            let resp = self.inner.should_bid_based_on_usage(request, usage).await?;
            Ok(self.hold(resp))
        })
    }
}
