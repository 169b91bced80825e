//! Capability strategies: is this node willing to run this kind of job,
//! independent of momentary capacity.

pub mod distance;
pub mod input_locality;
pub mod networking;
pub mod provider_installed;
pub mod stateless;
pub mod timeout;

pub use distance::{DistanceDelay, DistanceDelayStrategy};
pub use input_locality::{InputLocalityStrategy, InputLocalityStrategyParams};
pub use networking::NetworkingStrategy;
pub use provider_installed::ProviderInstalledStrategy;
pub use stateless::{StatelessJobStrategy, StatelessJobStrategyParams};
pub use timeout::{TimeoutStrategy, TimeoutStrategyParams};
