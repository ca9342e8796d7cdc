use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventReport
/// Ephemeral, in-memory counters for plan and load-state activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Plan construction
    pub plans_built: u64,
    pub plan_nodes_built: u64,
    pub plan_properties_built: u64,

    // Pruning
    pub prunes: u64,
    pub properties_pruned: u64,

    // Load-state tracking
    pub hydrates_full: u64,
    pub hydrates_partial: u64,
    pub transitions: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub plans_built: u64,
    pub prunes: u64,
    pub hydrates_full: u64,
    pub hydrates_partial: u64,
    pub transitions: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventReport> = RefCell::new(EventReport::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventReport) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventReport) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Snapshot the current counters.
#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventReport::default());
}
