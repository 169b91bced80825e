//! Decision model shared by every strategy.
//!
//! A `BidRequest` is built fresh for each job offer and handed to strategies
//! by reference, so no strategy can mutate the job. Strategies answer with a
//! `BidResponse`; an `Err` means no decision could be made.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use bidgrid_core::{Job, ResourceUsage};

use crate::error::BidResult;

/// One job offer, as seen by the evaluating node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub node_id: String,
    pub job: Job,
    /// Where the requester can be told about a deferred decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

impl BidRequest {
    pub fn new(node_id: impl Into<String>, job: Job) -> Self {
        Self {
            node_id: node_id.into(),
            job,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }
}

/// The verdict of a single strategy or of a whole chain.
///
/// `should_bid` with `should_wait` means "accept, but hold execution until
/// moderated". `!should_bid` with `should_wait` is a deferred rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BidResponse {
    pub should_bid: bool,
    pub should_wait: bool,
    pub reason: String,
}

impl BidResponse {
    /// The optimistic default: bid, nothing to report.
    pub fn proceed() -> Self {
        Self {
            should_bid: true,
            should_wait: false,
            reason: String::new(),
        }
    }

    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            should_bid: true,
            should_wait: false,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            should_bid: false,
            should_wait: false,
            reason: reason.into(),
        }
    }

    /// Accept when `should_bid` holds, reject otherwise, with the same reason.
    pub fn decide(should_bid: bool, reason: impl Into<String>) -> Self {
        Self {
            should_bid,
            should_wait: false,
            reason: reason.into(),
        }
    }

    /// Neither rejecting nor deferring.
    pub fn is_affirmative(&self) -> bool {
        self.should_bid && !self.should_wait
    }
}

/// Boxed future returned by strategies.
pub type BidFuture<'a> = Pin<Box<dyn Future<Output = BidResult<BidResponse>> + Send + 'a>>;

/// Wrap an already-known result for strategies that never suspend.
pub(crate) fn decided<'a>(result: BidResult<BidResponse>) -> BidFuture<'a> {
    Box::pin(std::future::ready(result))
}

/// "Should this node even consider this kind of job?"
///
/// Needs no resource figures. Implementations must not keep per-request state.
pub trait SemanticStrategy: Send + Sync {
    /// Identity used in logs.
    fn name(&self) -> &str;

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a>;
}

/// "Can this node afford this job right now?"
pub trait ResourceStrategy: Send + Sync {
    /// Identity used in logs.
    fn name(&self) -> &str;

    fn should_bid_based_on_usage<'a>(
        &'a self,
        request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a>;
}

impl<S: SemanticStrategy + ?Sized> SemanticStrategy for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        (**self).should_bid(request)
    }
}

impl<S: SemanticStrategy + ?Sized> SemanticStrategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        (**self).should_bid(request)
    }
}

impl<S: ResourceStrategy + ?Sized> ResourceStrategy for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        (**self).should_bid_based_on_usage(request, usage)
    }
}

impl<S: ResourceStrategy + ?Sized> ResourceStrategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        (**self).should_bid_based_on_usage(request, usage)
    }
}
