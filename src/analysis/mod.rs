//! Analysis modules.
//!
//! The aggregation engine and the shared metric table it applies.

pub mod aggregator;
pub mod metrics;

pub use aggregator::*;
pub use metrics::{Metric, MetricValue, METRIC_TABLE_VERSION};
