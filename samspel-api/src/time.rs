//! Simulation time axis.
//!
//! All simulation timestamps are nanoseconds on a single monotonic `i64`
//! axis. The constants below keep call sites readable when configs and tests
//! talk in coarser units.

/// Sentinel for a clock that has not been started yet.
pub const TIME_UNSET: i64 = -1;

/// One nanosecond, the base unit of simulation time.
pub const NANO_SECOND: i64 = 1;

/// One microsecond in simulation time units.
pub const MICRO_SECOND: i64 = 1_000;

/// One millisecond in simulation time units.
pub const MILLI_SECOND: i64 = 1_000_000;

/// One second in simulation time units.
pub const SECOND: i64 = 1_000_000_000;
