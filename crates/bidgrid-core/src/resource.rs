//! Resource usage figures compared by the resource phase.

use serde::{Deserialize, Serialize};

/// Declared or available resources: CPU cores, memory/disk bytes, GPUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceUsage {
    /// CPU in (fractional) cores.
    pub cpu: f64,
    /// Memory in bytes.
    pub memory: u64,
    /// Disk in bytes.
    pub disk: u64,
    /// Number of GPUs.
    pub gpu: u64,
}

impl ResourceUsage {
    pub fn new(cpu: f64, memory: u64, disk: u64, gpu: u64) -> Self {
        Self {
            cpu,
            memory,
            disk,
            gpu,
        }
    }

    /// Component-wise sum.
    pub fn add(&self, other: &ResourceUsage) -> ResourceUsage {
        ResourceUsage {
            cpu: self.cpu + other.cpu,
            memory: self.memory.saturating_add(other.memory),
            disk: self.disk.saturating_add(other.disk),
            gpu: self.gpu.saturating_add(other.gpu),
        }
    }

    /// True when every component fits within `other`. Equality fits.
    pub fn less_than_eq(&self, other: &ResourceUsage) -> bool {
        self.cpu <= other.cpu
            && self.memory <= other.memory
            && self.disk <= other.disk
            && self.gpu <= other.gpu
    }

    pub fn is_zero(&self) -> bool {
        self.cpu == 0.0 && self.memory == 0 && self.disk == 0 && self.gpu == 0
    }

    /// Replace zero components with the matching component of `defaults`.
    pub fn or_defaults(&self, defaults: &ResourceUsage) -> ResourceUsage {
        ResourceUsage {
            cpu: if self.cpu > 0.0 { self.cpu } else { defaults.cpu },
            memory: if self.memory > 0 { self.memory } else { defaults.memory },
            disk: if self.disk > 0 { self.disk } else { defaults.disk },
            gpu: if self.gpu > 0 { self.gpu } else { defaults.gpu },
        }
    }
}

impl std::fmt::Display for ResourceUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{cpu: {}, memory: {}, disk: {}, gpu: {}}}",
            self.cpu, self.memory, self.disk, self.gpu
        )
    }
}
