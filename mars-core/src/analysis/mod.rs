//! Post-debate analysis: attribution and cost
//!
//! Both analyzers are pure functions over a finished [`crate::types::DebateResult`];
//! neither suspends or performs I/O. They run once, after all debate rounds
//! and synthesis/judge calls have completed.

pub mod attribution;
pub mod cost;
pub mod sentences;
pub mod similarity;

pub use attribution::analyze_attribution;
pub use cost::analyze_cost;
