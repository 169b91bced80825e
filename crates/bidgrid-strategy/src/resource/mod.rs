//! Resource strategies: can this node afford the job right now.
//!
//! Both are pure comparisons: usage fits when every component is less than
//! or equal to the capacity it is compared against.

pub mod available_capacity;
pub mod max_capacity;

pub use available_capacity::{AvailableCapacityStrategy, AvailableCapacityStrategyParams};
pub use max_capacity::{MaxCapacityStrategy, MaxCapacityStrategyParams};
