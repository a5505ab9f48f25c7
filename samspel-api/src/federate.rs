//! The federate capability trait.

use crate::error::FederateError;

/// A simulation component driven forward by the time-management core.
///
/// Implementations must be safe to share across the worker pool; internal
/// mutability is the implementor's responsibility. Each federate's own
/// sequence of `advance_time` calls is totally ordered by the scheduler, but
/// two different federates inside one parallel batch run concurrently.
pub trait Federate: Send + Sync {
    /// Called once before the run starts, with the fixed simulation horizon.
    fn initialize(&self, start_time: i64, end_time: i64) -> Result<(), FederateError>;

    /// Advance this federate's local clock to `time`. Any error aborts the
    /// whole simulation run.
    fn advance_time(&self, time: i64) -> Result<(), FederateError>;

    /// Called once per run, for every federate, even after failures.
    fn finish_simulation(&self) -> Result<(), FederateError>;

    /// Whether this federate only accepts interactions in timestamp order.
    fn is_time_constrained(&self) -> bool {
        true
    }

    /// Whether this federate's requests regulate the global clock.
    fn is_time_regulating(&self) -> bool {
        true
    }
}
