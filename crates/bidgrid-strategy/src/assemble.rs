//! Default strategy assembly from a `NodeConfig`.
//!
//! Semantic order, cheapest first and probes last:
//!
//! 1. distance-delay (only when `[distance] enabled`)
//! 2. networking
//! 3. timeout
//! 4. stateless-job
//! 5. engine / publisher / storage installed
//! 6. input-locality
//! 7. external-command, external-http
//!
//! Resource order: max-capacity (only when `NodeConfig::job_ceiling` is
//! non-zero), then available-capacity. With either waiting flag set, both chains are
//! wrapped in the waiting decorator.

use std::collections::HashSet;
use std::sync::Arc;

use bidgrid_core::NodeConfig;

use crate::bidder::{Bidder, BidderParams};
use crate::capacity::{
    CapacityTracker, DeclaredUsageCalculator, LocalCapacityTracker, UsageCalculator,
};
use crate::chain::{ResourceChain, SemanticChain};
use crate::error::BidResult;
use crate::model::{ResourceStrategy, SemanticStrategy};
use crate::probe::{
    ExternalCommandStrategy, ExternalCommandStrategyParams, ExternalHttpStrategy,
    ExternalHttpStrategyParams,
};
use crate::providers::{StaticLocality, StorageLocality};
use crate::resource::{
    AvailableCapacityStrategy, AvailableCapacityStrategyParams, MaxCapacityStrategy,
    MaxCapacityStrategyParams,
};
use crate::semantic::{
    DistanceDelayStrategy, InputLocalityStrategy, InputLocalityStrategyParams, NetworkingStrategy,
    ProviderInstalledStrategy, StatelessJobStrategy, StatelessJobStrategyParams, TimeoutStrategy,
    TimeoutStrategyParams,
};
use crate::waiting::{WaitingStrategy, WaitingStrategyParams};

/// Node-side services the strategies consult.
#[derive(Clone)]
pub struct Collaborators {
    pub locality: Arc<dyn StorageLocality>,
    pub running: Arc<dyn CapacityTracker>,
    pub enqueued: Arc<dyn CapacityTracker>,
    pub usage: Arc<dyn UsageCalculator>,
}

impl Collaborators {
    /// In-memory collaborators seeded from the config: locality from
    /// `local_sources` keyed by storage type, the whole `[capacity.total]` free for running jobs,
    /// an empty queue, and declared usage filled from `[capacity.job_defaults]`.
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            locality: Arc::new(StaticLocality::new(
                config.selection.local_sources.iter().cloned(),
            )),
            running: Arc::new(LocalCapacityTracker::new(config.capacity.total)),
            enqueued: Arc::new(LocalCapacityTracker::default()),
            usage: Arc::new(DeclaredUsageCalculator::new(config.capacity.job_defaults)),
        }
    }
}

fn registry(keys: &[String]) -> HashSet<String> {
    keys.iter().cloned().collect()
}

pub fn semantic_chain(
    config: &NodeConfig,
    locality: Arc<dyn StorageLocality>,
) -> BidResult<SemanticChain> {
    let selection = &config.selection;
    let probe_timeout = config.probe_timeout()?;
    let mut chain = SemanticChain::new();

    if config.distance.enabled {
        chain.add(DistanceDelayStrategy::new(config.distance.network_size)?);
    }
    chain.add(NetworkingStrategy::new(selection.accept_networked_jobs));
    chain.add(TimeoutStrategy::new(TimeoutStrategyParams {
        min_job_execution_timeout: config.min_job_timeout()?,
        max_job_execution_timeout: config.max_job_timeout()?,
        bypass_namespaces: config.timeouts.bypass_namespaces.iter().cloned().collect(),
    })?);
    chain.add(StatelessJobStrategy::new(StatelessJobStrategyParams {
        reject_stateless_jobs: selection.reject_stateless_jobs,
    }));
    chain.add(ProviderInstalledStrategy::engine(registry(
        &config.providers.engines,
    )));
    chain.add(ProviderInstalledStrategy::publisher(registry(
        &config.providers.publishers,
    )));
    chain.add(ProviderInstalledStrategy::storage(registry(
        &config.providers.storages,
    )));
    chain.add(InputLocalityStrategy::new(InputLocalityStrategyParams {
        locality: selection.locality,
        storages: locality,
    }));
    chain.add(ExternalCommandStrategy::new(ExternalCommandStrategyParams {
        command: selection.probe_exec.clone(),
        timeout: probe_timeout,
    })?);
    chain.add(ExternalHttpStrategy::new(ExternalHttpStrategyParams {
        url: selection.probe_http.clone(),
        timeout: probe_timeout,
        max_response_bytes: usize::try_from(selection.max_probe_response_bytes)
            .unwrap_or(usize::MAX),
    })?);

    Ok(chain)
}

pub fn resource_chain(
    config: &NodeConfig,
    running: Arc<dyn CapacityTracker>,
    enqueued: Arc<dyn CapacityTracker>,
) -> ResourceChain {
    let mut chain = ResourceChain::new();
    let ceiling = config.job_ceiling();
    if !ceiling.is_zero() {
        chain.add(MaxCapacityStrategy::new(MaxCapacityStrategyParams {
            max_job_requirements: ceiling,
        }));
    }
    chain.add(AvailableCapacityStrategy::new(
        AvailableCapacityStrategyParams { running, enqueued },
    ));
    chain
}

/// Build the full two-phase bidder for a node.
pub fn build_bidder(config: &NodeConfig, collaborators: Collaborators) -> BidResult<Bidder> {
    let semantic = semantic_chain(config, collaborators.locality)?;
    let resource = resource_chain(config, collaborators.running, collaborators.enqueued);

    let (semantic, resource): (Box<dyn SemanticStrategy>, Box<dyn ResourceStrategy>) =
        if config.waiting.is_enabled() {
            let params = WaitingStrategyParams {
                wait_on_bid: config.waiting.wait_on_bid,
                wait_on_no_bid: config.waiting.wait_on_no_bid,
            };
            (
                Box::new(WaitingStrategy::new(semantic, params)),
                Box::new(WaitingStrategy::new(resource, params)),
            )
        } else {
            (Box::new(semantic), Box::new(resource))
        };

    Ok(Bidder::new(BidderParams {
        semantic,
        resource,
        usage_calculator: collaborators.usage,
    }))
}
