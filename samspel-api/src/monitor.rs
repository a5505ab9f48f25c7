//! Observer callbacks fired by the scheduler.
//!
//! All callbacks are fire-and-forget: the scheduler never waits on them or
//! inspects a return value, and a monitor must not block the scheduling
//! thread for longer than it takes to record an observation.

use std::time::Duration;

use crate::event::FederateEvent;
use crate::registry::FederationRegistry;

pub trait Monitor: Send + Sync {
    /// Fired once before federates are initialized.
    fn on_begin_simulation(&self, _federation: &dyn FederationRegistry, _thread_count: usize) {}

    /// Fired for every event pulled into a parallel round, with the round id.
    fn on_scheduling(&self, _round: u64, _event: &FederateEvent) {}

    /// Fired immediately before a federate's `advance_time`.
    fn on_begin_activity(&self, _event: &FederateEvent) {}

    /// Fired after a federate's `advance_time` returned, with the wall-clock
    /// duration of the call.
    fn on_end_activity(&self, _event: &FederateEvent, _duration: Duration) {}

    /// Fired once at the very end of the run, after all federates finished.
    fn on_end_simulation(&self, _duration: Duration, _status_code: i32) {}
}

/// Monitor that observes nothing.
pub struct NoopMonitor;

impl Monitor for NoopMonitor {}
