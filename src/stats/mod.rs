//! Profile statistics collection and reporting.

/// Fetch-phase orchestration.
pub mod collector;
/// Report assembly and display rendering.
pub mod report;

pub use collector::collect_profile_stats;
pub use report::{AccountAge, ProfileStats};
