use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for one thread's stores.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) kinds: BTreeMap<String, KindCounters>,
    pub(crate) events: BTreeMap<String, u64>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Dispatch
    pub dispatches: u64,
    pub notifications: u64,

    // Cache
    pub merges: u64,
    pub entities_inserted: u64,
    pub entities_updated: u64,

    // Failures
    pub request_failures: u64,
    pub responses_rejected: u64,

    // Pagination and relations
    pub pages_suppressed: u64,
    pub relation_noops: u64,
}

///
/// KindCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct KindCounters {
    pub merges: u64,
    pub entities_inserted: u64,
    pub entities_updated: u64,
    pub request_failures: u64,
    pub responses_rejected: u64,
}

///
/// EventReport
/// Point-in-time copy of the counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub kinds: BTreeMap<String, KindCounters>,

    /// Dispatch count per event name.
    pub events: BTreeMap<String, u64>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    EVENT_STATE.with(|m| {
        let state = m.borrow();
        EventReport {
            ops: state.ops.clone(),
            kinds: state.kinds.clone(),
            events: state.events.clone(),
        }
    })
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}
