//! bidgrid-core — shared types for the BidGrid bid strategy engine.
//!
//! Everything here is consumed read-only by strategies: the job model a
//! requester broadcasts, the resource usage figures the resource phase
//! compares, and the node configuration that decides which strategies a
//! compute node runs.

pub mod config;
pub mod duration;
pub mod error;
pub mod job;
pub mod resource;

pub use config::{LocalSource, NodeConfig};
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use job::{InputSource, Job, NetworkMode, Task};
pub use resource::ResourceUsage;
