//! Host metric sampling and data structures.
//!
//! This module reads instantaneous CPU, memory, disk and network figures from
//! the operating system and defines the [`HealthRecord`] they are assembled into.

pub mod collector;
pub mod data;
pub mod fixed;
pub mod traits;

// Re-export commonly used items
pub use collector::SystemSampler;
pub use data::{HealthRecord, Metric};
pub use fixed::FixedSampler;
pub use traits::MetricSampler;
