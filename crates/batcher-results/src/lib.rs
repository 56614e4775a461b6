//! Result aggregation for batcher runs.
//!
//! Stats are pulled per job through a [`StatsProvider`], grouped into a
//! [`ResultTree`] keyed by the requested parameters and emitted as CSV.

mod aggregate;
mod stats;
mod tree;

pub use aggregate::{Aggregation, ResultAggregator};
pub use stats::{parse_output, ShellStats, StatValue, StatsProvider, FALLBACK_VALUE, MISSING};
pub use tree::ResultTree;
