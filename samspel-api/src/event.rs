//! Time-advance request events.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

static EVENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier of a federate within the federation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FederateId(String);

impl FederateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FederateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FederateId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A federate's request to be advanced to a certain simulation time.
///
/// Created when a federate calls `request_advance_time` and immutable from
/// then on. `lookahead` is the minimum delta after `requested_time` before
/// the requesting federate can produce a causal effect; it bounds how far
/// other events may be executed in parallel with this one.
#[derive(Debug, Clone)]
pub struct FederateEvent {
    id: u64,
    federate: FederateId,
    requested_time: i64,
    lookahead: i64,
    priority: u8,
}

impl FederateEvent {
    pub fn new(federate: FederateId, requested_time: i64, lookahead: i64, priority: u8) -> Self {
        Self {
            id: EVENT_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed) + 1,
            federate,
            requested_time,
            lookahead,
            priority,
        }
    }

    /// Unique id of this event, used only for activity logging.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn federate(&self) -> &FederateId {
        &self.federate
    }

    /// Requested simulation time in [ns].
    pub fn requested_time(&self) -> i64 {
        self.requested_time
    }

    /// Lookahead in [ns].
    pub fn lookahead(&self) -> i64 {
        self.lookahead
    }

    /// Tie-break priority for equal-time events. Lower value wins.
    pub fn priority(&self) -> u8 {
        self.priority
    }
}

impl fmt::Display for FederateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.federate, self.requested_time)
    }
}

/// Logical equality over the four request fields; the event id is excluded
/// so that identical requests coalesce in the event queue.
impl PartialEq for FederateEvent {
    fn eq(&self, other: &Self) -> bool {
        self.federate == other.federate
            && self.requested_time == other.requested_time
            && self.lookahead == other.lookahead
            && self.priority == other.priority
    }
}

impl Eq for FederateEvent {}

impl std::hash::Hash for FederateEvent {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.federate.hash(state);
        self.requested_time.hash(state);
        self.lookahead.hash(state);
        self.priority.hash(state);
    }
}

/// Scheduling order: earliest requested time first, then lowest priority
/// value (0 = most urgent), then smallest lookahead. The federate id breaks
/// the final tie so the order is total and deterministic.
impl Ord for FederateEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.requested_time
            .cmp(&other.requested_time)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.lookahead.cmp(&other.lookahead))
            .then_with(|| self.federate.cmp(&other.federate))
    }
}

impl PartialOrd for FederateEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
