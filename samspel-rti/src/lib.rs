//! # samspel-rti
//!
//! Time management for a federated, time-stepped co-simulation. Federates
//! request advances of their local clocks; the scheduler drains those
//! requests in time order, keeps the global clock monotonic, and, in the
//! parallel strategy, runs causally-independent federates concurrently
//! within the bounds their lookaheads guarantee.
//!
//! Two run-loop strategies are provided:
//! - [`SequentialScheduler`]: strictly serial, fully deterministic.
//! - [`ParallelScheduler`]: batches events whose time windows cannot
//!   causally affect each other and dispatches them to a worker pool.

pub mod monitor;
pub mod perf;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod throttle;
pub mod watchdog;

pub use queue::EventQueue;
pub use scheduler::parallel::ParallelScheduler;
pub use scheduler::sequential::SequentialScheduler;
pub use scheduler::{TimeManagement, TimeRequester, STATUS_CODE_ERROR, STATUS_CODE_SUCCESS};
pub use throttle::{RealtimeThrottle, SystemClock, WallClock};
pub use watchdog::WatchdogHandle;

use std::sync::Arc;

use samspel_api::{FederationRegistry, Monitor};
use samspel_config::{SchedulerConfig, SchedulingStrategy};

/// Builds the scheduler the configuration asks for.
pub fn build_scheduler(
    config: &SchedulerConfig,
    federation: Arc<dyn FederationRegistry>,
    monitor: Arc<dyn Monitor>,
) -> Box<dyn TimeManagement> {
    match config.strategy() {
        SchedulingStrategy::Sequential => Box::new(
            SequentialScheduler::new(federation, monitor, config.end_time)
                .with_realtime_factor(config.realtime_factor),
        ),
        SchedulingStrategy::Parallel => Box::new(ParallelScheduler::new(
            federation,
            monitor,
            config.end_time,
            config.threads,
        )),
    }
}
