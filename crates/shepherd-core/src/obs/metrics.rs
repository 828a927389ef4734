use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// EventState
/// Ephemeral, in-memory counters for engine operations and walk events.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub walk: WalkCounters,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Engine entrypoints
    pub extract_state_calls: u64,
    pub apply_state_calls: u64,
    pub extract_changes_calls: u64,
    pub apply_changes_calls: u64,
    pub reverse_calls: u64,
    pub validate_calls: u64,
}

///
/// WalkCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct WalkCounters {
    pub entities_visited: u64,
    pub children_built: u64,
    pub marked_for_destruction: u64,
    pub conflicts_detected: u64,
    pub schema_mismatches: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow counters mutably.
pub(crate) fn count(f: impl FnOnce(&mut EventState)) {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()));
}

/// Point-in-time snapshot of the counters.
#[must_use]
pub fn report() -> EventState {
    EVENT_STATE.with(|m| m.borrow().clone())
}

/// Reset all counters (useful in tests).
pub fn reset() {
    EVENT_STATE.with(|m| *m.borrow_mut() = EventState::default());
}
