//! bidgrid-strategy — bid admission control for BidGrid compute nodes.
//!
//! When a requester broadcasts a job, every node runs this engine to decide
//! whether to bid, decline, or bid and hold the decision for moderation.
//! Strategies are small stateless policies composed into ordered chains
//! that stop at the first rejection, hold or error.
//!
//! # Architecture
//!
//! ```text
//! Bidder
//!   ├── Semantic chain (SemanticStrategy)
//!   │   ├── DistanceDelayStrategy (hash-ring self-throttling)
//!   │   ├── Networking / Timeout / StatelessJob
//!   │   ├── ProviderInstalledStrategy (engine, publisher, storage)
//!   │   ├── InputLocalityStrategy → StorageLocality
//!   │   └── ExternalCommandStrategy / ExternalHttpStrategy (probes)
//!   ├── UsageCalculator → ResourceUsage
//!   └── Resource chain (ResourceStrategy)
//!       ├── MaxCapacityStrategy (per-job ceiling)
//!       └── AvailableCapacityStrategy → CapacityTracker (running + enqueued)
//! ```
//!
//! Either chain may be wrapped in a `WaitingStrategy`, which forces
//! `should_wait` onto its verdict.
//!
//! # Cancellation
//!
//! Evaluations are plain futures. Dropping one (for example through
//! `Bidder::run_bidding_within` or `tokio::time::timeout`) cancels any
//! distance-delay sleep and kills any probe subprocess still running.

pub mod assemble;
pub mod bidder;
pub mod capacity;
pub mod chain;
pub mod error;
pub mod model;
pub mod probe;
pub mod providers;
pub mod resource;
pub mod semantic;
pub mod waiting;

pub use assemble::{Collaborators, build_bidder};
pub use bidder::{BidOutcome, Bidder, BidderParams};
pub use capacity::{CapacityTracker, DeclaredUsageCalculator, LocalCapacityTracker, UsageCalculator};
pub use chain::{ResourceChain, SemanticChain};
pub use error::{BidError, BidResult};
pub use model::{BidFuture, BidRequest, BidResponse, ResourceStrategy, SemanticStrategy};
pub use providers::{ProviderRegistry, StaticLocality, StorageLocality};
pub use waiting::{WaitingStrategy, WaitingStrategyParams};
