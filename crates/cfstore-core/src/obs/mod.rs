//! Observability: in-memory store counters and the sink abstraction.
//!
//! Structured logs go through `tracing` at the call sites; this module only
//! carries counters.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, KindCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
