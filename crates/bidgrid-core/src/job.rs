//! Job model as broadcast by requester nodes.
//!
//! Strategies only ever read these records. Every field is optional on the
//! wire; a missing field means "no constraint".

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceUsage;

/// A job offered to compute nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub id: String,
    pub name: String,
    /// Owner of the job. Used for per-owner policy exemptions.
    pub namespace: String,
    /// How many nodes the requester wants to run the job.
    pub concurrency: u32,
    /// Minimum number of bids the requester waits for before selecting.
    pub min_bids: u32,
    pub task: Task,
    pub labels: HashMap<String, String>,
}

impl Job {
    /// Declared execution timeout, or `None` when the job declares none.
    pub fn timeout(&self) -> Option<Duration> {
        match self.task.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Whether the job asks for any network access at all.
    pub fn requires_network(&self) -> bool {
        self.task.network != NetworkMode::None
    }

    /// Number of nodes expected to bid: the larger of concurrency and
    /// minimum bids, never below one.
    pub fn bid_concurrency(&self) -> u32 {
        self.concurrency.max(self.min_bids).max(1)
    }

    /// Whether the job declares no input data.
    pub fn is_stateless(&self) -> bool {
        self.task.inputs.is_empty()
    }
}

/// The single task a job executes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub name: String,
    /// Execution engine key, e.g. "docker" or "wasm".
    pub engine: String,
    /// Publisher key for results, e.g. "ipfs" or "s3".
    pub publisher: String,
    pub network: NetworkMode,
    /// Execution timeout in seconds. Zero means none declared.
    pub timeout_secs: u64,
    pub inputs: Vec<InputSource>,
    /// Resources the requester declared for the task.
    pub resources: ResourceUsage,
}

/// A declared input volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputSource {
    /// Storage driver key, e.g. "ipfs", "s3", "urldownload", "inline".
    pub storage_type: String,
    /// Driver-specific locator (CID, URL, bucket path).
    pub source: String,
    /// Mount point inside the execution.
    pub target: String,
}

/// Network access requested by a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    #[default]
    None,
    Http,
    Full,
    Host,
}

impl std::fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetworkMode::None => "none",
            NetworkMode::Http => "http",
            NetworkMode::Full => "full",
            NetworkMode::Host => "host",
        };
        f.write_str(s)
    }
}
