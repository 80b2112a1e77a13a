//! Record consumption and metrics (dependency-light).
//!
//! Traffic records are drained into a per-key tally and rendered as
//! Prometheus text by the `/metrics` handler.

pub mod metrics;
pub mod tally;

pub use metrics::TrafficMetrics;
pub use tally::{KeyTotals, TallyEntry, TrafficTally};
