//! Metrics sink boundary.
//!
//! Store logic never touches `obs::metrics` directly; every counter update
//! flows through [`MetricsEvent`] and a [`MetricsSink`].

use crate::obs::metrics::{self, EventReport};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    Dispatch {
        event: &'static str,
    },
    Merge {
        kind: &'a str,
        inserted: u64,
        updated: u64,
    },
    RequestFailure {
        kind: &'a str,
    },
    Rejected {
        kind: &'a str,
    },
    PageSuppressed {
        kind: &'a str,
    },
    RelationNoop,
    Notify {
        observers: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink writing into the thread's global counters.
/// Used whenever a store has no sink of its own.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Dispatch { event } => metrics::with_state_mut(|m| {
                m.ops.dispatches = m.ops.dispatches.saturating_add(1);
                let count = m.events.entry(event.to_string()).or_default();
                *count = count.saturating_add(1);
            }),

            MetricsEvent::Merge {
                kind,
                inserted,
                updated,
            } => metrics::with_state_mut(|m| {
                m.ops.merges = m.ops.merges.saturating_add(1);
                m.ops.entities_inserted = m.ops.entities_inserted.saturating_add(inserted);
                m.ops.entities_updated = m.ops.entities_updated.saturating_add(updated);

                let entry = m.kinds.entry(kind.to_string()).or_default();
                entry.merges = entry.merges.saturating_add(1);
                entry.entities_inserted = entry.entities_inserted.saturating_add(inserted);
                entry.entities_updated = entry.entities_updated.saturating_add(updated);
            }),

            MetricsEvent::RequestFailure { kind } => metrics::with_state_mut(|m| {
                m.ops.request_failures = m.ops.request_failures.saturating_add(1);
                let entry = m.kinds.entry(kind.to_string()).or_default();
                entry.request_failures = entry.request_failures.saturating_add(1);
            }),

            MetricsEvent::Rejected { kind } => metrics::with_state_mut(|m| {
                m.ops.responses_rejected = m.ops.responses_rejected.saturating_add(1);
                let entry = m.kinds.entry(kind.to_string()).or_default();
                entry.responses_rejected = entry.responses_rejected.saturating_add(1);
            }),

            MetricsEvent::PageSuppressed { .. } => metrics::with_state_mut(|m| {
                m.ops.pages_suppressed = m.ops.pages_suppressed.saturating_add(1);
            }),

            MetricsEvent::RelationNoop => metrics::with_state_mut(|m| {
                m.ops.relation_noops = m.ops.relation_noops.saturating_add(1);
            }),

            MetricsEvent::Notify { observers } => metrics::with_state_mut(|m| {
                m.ops.notifications = m.ops.notifications.saturating_add(observers);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}
