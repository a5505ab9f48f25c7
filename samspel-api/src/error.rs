//! Error taxonomy shared between the core and its collaborators.

use thiserror::Error;

use crate::event::FederateId;

/// Failure raised from within a federate implementation.
#[derive(Debug, Error)]
pub enum FederateError {
    #[error("execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures surfaced by the time-management core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A federate requested a time earlier than the current clock. Rejected
    /// synchronously; the event queue is left untouched.
    #[error("federate '{federate}' requested time {requested} which is already in the past (current time is {current})")]
    InvalidTimeRequest {
        federate: FederateId,
        requested: i64,
        current: i64,
    },

    /// The scheduler was constructed with a negative end time.
    #[error("invalid end time: {0}")]
    InvalidEndTime(i64),

    /// A time advance was requested with no pending events.
    #[error("no next event in queue")]
    EmptyQueue,

    /// A federate joined under an id that is already taken.
    #[error("federate '{0}' has already joined the federation")]
    AlreadyJoined(FederateId),

    /// A federate's `advance_time` or `initialize` call failed.
    #[error("federate '{federate}' failed")]
    FederateFailure {
        federate: FederateId,
        #[source]
        source: FederateError,
    },

    /// First failure among the workers of one parallel round. Later failures
    /// in the same round are dropped.
    #[error("worker failed while advancing federate '{federate}'")]
    WorkerFailure {
        federate: FederateId,
        #[source]
        source: FederateError,
    },
}
