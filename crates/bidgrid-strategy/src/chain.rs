//! Chain evaluator: ordered, short-circuiting composition of strategies.
//!
//! Strategies run strictly in list order. The first strategy that errors,
//! rejects or defers decides the outcome and nothing after it runs. When
//! every strategy affirms, the chain answers `BidResponse::proceed()`.
//!
//! Chains are built once at startup. `add` takes `&mut self`, so a chain
//! shared behind an `Arc` for evaluation can no longer grow.

use tracing::{debug, error};

use bidgrid_core::ResourceUsage;

use crate::error::BidResult;
use crate::model::{BidFuture, BidRequest, BidResponse, ResourceStrategy, SemanticStrategy};

/// Ordered list of semantic strategies, itself a semantic strategy.
#[derive(Default)]
pub struct SemanticChain {
    strategies: Vec<Box<dyn SemanticStrategy>>,
}

impl SemanticChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SemanticStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy to the end of the chain.
    pub fn add(&mut self, strategy: impl SemanticStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl SemanticStrategy for SemanticChain {
    fn name(&self) -> &str {
        "semantic-chain"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            for strategy in &self.strategies {
                let result = strategy.should_bid(request).await;
                if let Some(decisive) = settle(strategy.name(), request, result)? {
                    return Ok(decisive);
                }
            }
            Ok(BidResponse::proceed())
        })
    }
}

/// Ordered list of resource strategies, itself a resource strategy.
#[derive(Default)]
pub struct ResourceChain {
    strategies: Vec<Box<dyn ResourceStrategy>>,
}

impl ResourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResourceStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy to the end of the chain.
    pub fn add(&mut self, strategy: impl ResourceStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl ResourceStrategy for ResourceChain {
    fn name(&self) -> &str {
        "resource-chain"
    }

    fn should_bid_based_on_usage<'a>(
        &'a self,
        request: &'a BidRequest,
        usage: &'a ResourceUsage,
    ) -> BidFuture<'a> {
        Box::pin(async move {
            for strategy in &self.strategies {
                let result = strategy.should_bid_based_on_usage(request, usage).await;
                if let Some(decisive) = settle(strategy.name(), request, result)? {
                    return Ok(decisive);
                }
            }
            Ok(BidResponse::proceed())
        })
    }
}

/// Inspect one strategy's result.
///
/// Returns `Ok(Some(_))` when the response ends the chain, `Ok(None)` to
/// continue, and propagates errors unchanged.
fn settle(
    strategy: &str,
    request: &BidRequest,
    result: BidResult<BidResponse>,
) -> BidResult<Option<BidResponse>> {
    match result {
        Err(e) => {
            error!(
                job_id = %request.job.id,
                node_id = %request.node_id,
                %strategy,
                error = %e,
                "bid strategy failed"
            );
            Err(e)
        }
        Ok(resp) if resp.is_affirmative() => Ok(None),
        Ok(resp) => {
            debug!(
                job_id = %request.job.id,
                node_id = %request.node_id,
                %strategy,
                should_bid = resp.should_bid,
                should_wait = resp.should_wait,
                reason = %resp.reason,
                "bid strategy stopped the chain"
            );
            Ok(Some(resp))
        }
    }
}
