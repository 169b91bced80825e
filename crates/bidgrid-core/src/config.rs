//! Node configuration (`bidgrid.toml`) parser.
//!
//! Every section is optional. An empty file yields a node that accepts
//! un-networked jobs from anywhere with no probes and no capacity ceilings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};
use crate::resource::ResourceUsage;

pub const DEFAULT_PROBE_TIMEOUT: &str = "10s";
pub const DEFAULT_MAX_PROBE_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub selection: SelectionConfig,
    pub timeouts: TimeoutConfig,
    pub distance: DistanceConfig,
    pub capacity: CapacityConfig,
    pub waiting: WaitingConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    pub id: String,
}

/// Where a job's input data must live for this node to bid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    /// Only bid when every input is already present on the node.
    Local,
    /// Bid regardless of where inputs live.
    #[default]
    Anywhere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub locality: Locality,
    pub reject_stateless_jobs: bool,
    pub accept_networked_jobs: bool,
    /// Shell command consulted for every offer. Empty disables the probe.
    pub probe_exec: String,
    /// Webhook consulted for every offer. Empty disables the probe.
    pub probe_http: String,
    pub probe_timeout: String,
    pub max_probe_response_bytes: u64,
    /// Inputs already present on this node.
    pub local_sources: Vec<LocalSource>,
}

/// An input held by this node. The same source string under a different
/// storage type is a different input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalSource {
    pub storage_type: String,
    /// CID, URL, or whatever the storage type addresses inputs by.
    pub source: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            locality: Locality::Anywhere,
            reject_stateless_jobs: false,
            accept_networked_jobs: false,
            probe_exec: String::new(),
            probe_http: String::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT.to_string(),
            max_probe_response_bytes: DEFAULT_MAX_PROBE_RESPONSE_BYTES,
            local_sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub min_job_execution_timeout: String,
    /// "0s" means no upper bound.
    pub max_job_execution_timeout: String,
    /// Job namespaces exempt from both bounds.
    pub bypass_namespaces: Vec<String>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            min_job_execution_timeout: "0s".to_string(),
            max_job_execution_timeout: "0s".to_string(),
            bypass_namespaces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    pub enabled: bool,
    /// Estimated number of compute nodes in the network.
    pub network_size: u32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            network_size: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Total capacity this node offers across all jobs.
    pub total: ResourceUsage,
    /// Ceiling for any single job. Zero fields fall back to `total`.
    pub job: ResourceUsage,
    /// Applied to zero fields of a job's declared resources.
    pub job_defaults: ResourceUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitingConfig {
    pub wait_on_bid: bool,
    pub wait_on_no_bid: bool,
}

impl WaitingConfig {
    pub fn is_enabled(&self) -> bool {
        self.wait_on_bid || self.wait_on_no_bid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub engines: Vec<String>,
    pub storages: Vec<String>,
    pub publishers: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            engines: vec!["docker".to_string(), "wasm".to_string()],
            storages: vec!["ipfs".to_string(), "urldownload".to_string(), "inline".to_string()],
            publishers: vec!["ipfs".to_string()],
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value that strategies would otherwise reject at
    /// construction time.
    pub fn validate(&self) -> ConfigResult<()> {
        self.probe_timeout()?;
        let min = self.min_job_timeout()?;
        if let Some(max) = self.max_job_timeout()? {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "min_job_execution_timeout {min:?} exceeds max_job_execution_timeout {max:?}"
                )));
            }
        }
        if self.distance.network_size == 0 {
            return Err(ConfigError::Invalid(
                "distance.network_size must be at least 1".to_string(),
            ));
        }
        if self.selection.max_probe_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "selection.max_probe_response_bytes must be positive".to_string(),
            ));
        }

        let capacity = &self.capacity;
        let ceiling = self.job_ceiling();
        if !capacity.total.is_zero() && !ceiling.less_than_eq(&capacity.total) {
            return Err(ConfigError::Invalid(format!(
                "capacity.job {ceiling} exceeds capacity.total {}",
                capacity.total
            )));
        }
        if !ceiling.is_zero() && !capacity.job_defaults.less_than_eq(&ceiling) {
            return Err(ConfigError::Invalid(format!(
                "capacity.job_defaults {} exceeds the per-job ceiling {ceiling}",
                capacity.job_defaults
            )));
        }
        Ok(())
    }

    /// Effective per-job ceiling: `[capacity.job]` with unset fields taken
    /// from `[capacity.total]`. All-zero means no ceiling.
    pub fn job_ceiling(&self) -> ResourceUsage {
        self.capacity.job.or_defaults(&self.capacity.total)
    }

    pub fn probe_timeout(&self) -> ConfigResult<Duration> {
        parse_duration(&self.selection.probe_timeout)
    }

    pub fn min_job_timeout(&self) -> ConfigResult<Duration> {
        parse_duration(&self.timeouts.min_job_execution_timeout)
    }

    /// Upper timeout bound, `None` when unbounded.
    pub fn max_job_timeout(&self) -> ConfigResult<Option<Duration>> {
        let max = parse_duration(&self.timeouts.max_job_execution_timeout)?;
        Ok((!max.is_zero()).then_some(max))
    }

    /// Scaffold a minimal config for a node.
    pub fn scaffold(node_id: &str) -> Self {
        NodeConfig {
            node: NodeSection {
                id: node_id.to_string(),
            },
            ..Default::default()
        }
    }
}
