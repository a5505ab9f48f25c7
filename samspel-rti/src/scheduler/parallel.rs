//! Batching run-loop strategy.
//!
//! A federate guarantees it cannot produce a causal effect before
//! `requested_time + lookahead`. Any event strictly inside that window is
//! therefore safe to execute concurrently with it. The loop below pops the
//! minimum event, pulls every further same-priority event that fits under
//! the shrinking batch horizon, and dispatches the batch to the worker
//! pool. Rounds never overlap: the scheduling thread blocks until the pool
//! is idle before it shapes the next batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use samspel_api::{FederateId, FederationRegistry, Monitor, SchedulerError};

use crate::perf::PerformanceTracker;
use crate::pool::WorkerPool;
use crate::scheduler::{
    SchedulerCore, TimeManagement, TimeRequester, STATUS_CODE_ERROR, STATUS_CODE_SUCCESS,
};
use crate::watchdog::WatchdogHandle;

static ROUND_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_round_id() -> u64 {
    ROUND_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Parallel time management: causally-independent federates advance
/// concurrently on a bounded worker pool.
pub struct ParallelScheduler {
    core: SchedulerCore,
    pool: WorkerPool,
}

impl ParallelScheduler {
    pub fn new(
        federation: Arc<dyn FederationRegistry>,
        monitor: Arc<dyn Monitor>,
        end_time: i64,
        thread_count: usize,
    ) -> Self {
        let pool = WorkerPool::new(
            Arc::clone(&federation),
            Arc::clone(&monitor),
            thread_count,
        );
        Self {
            core: SchedulerCore::new(federation, monitor, end_time),
            pool,
        }
    }

    /// Handle federates use to file time requests, also from worker threads.
    pub fn requester(&self) -> TimeRequester {
        self.core.requester()
    }

    fn run_loop(&mut self) -> Result<(), SchedulerError> {
        // Workers come up before the federates are initialized, so requests
        // filed during initialization already find a live pool.
        self.pool.start();
        self.core.prepare_run()?;

        let mut perf = PerformanceTracker::new();

        while !self.core.queue_is_empty() && self.core.clock() < self.core.end_time() {
            let event = match self.core.pop_event() {
                Some(event) if event.requested_time() <= self.core.end_time() => event,
                _ => {
                    debug!("no more dispatchable events, finishing run");
                    self.core.set_clock(self.core.end_time());
                    break;
                }
            };
            self.core.set_clock(event.requested_time());
            let priority = event.priority();
            debug!(time = event.requested_time(), "new minimum valid simulation time");

            let parallel_eligible = self.core.peek_event().is_some_and(|next| {
                next.priority() == priority
                    && next.requested_time() <= event.requested_time() + event.lookahead()
            });

            if parallel_eligible {
                let round = next_round_id();
                let batch = self.pool.batch();
                batch.begin_round();
                self.core.monitor().on_scheduling(round, &event);
                batch.push(event);

                // Keep pulling while the next event stays inside the batch
                // horizon; every pull can only shrink the horizon further.
                while let Some(next) = self.core.peek_event() {
                    if next.priority() != priority
                        || next.requested_time() > batch.horizon()
                    {
                        break;
                    }
                    let Some(next) = self.core.pop_event() else {
                        break;
                    };
                    debug!(
                        federate = %next.federate(),
                        time = next.requested_time(),
                        lookahead = next.lookahead(),
                        "parallel execution"
                    );
                    self.core.monitor().on_scheduling(round, &next);
                    batch.push(next);
                }

                batch.wait_idle();
                if let Some(failure) = batch.take_failure() {
                    return Err(failure);
                }
            } else {
                self.core.dispatch_direct(&event)?;
            }

            let now = Instant::now();
            let sample = perf.update(self.core.clock(), self.core.end_time(), now);
            self.core.report_progress(now, sample);
            self.core.update_watchdog();
        }

        Ok(())
    }
}

impl TimeManagement for ParallelScheduler {
    fn request_advance_time(
        &self,
        federate: &FederateId,
        time: i64,
        lookahead: i64,
        priority: u8,
    ) -> Result<(), SchedulerError> {
        self.core.requester().request_advance_time(federate, time, lookahead, priority)
    }

    fn run_simulation(&mut self) -> Result<(), SchedulerError> {
        self.core.monitor().on_begin_simulation(
            self.core.federation().as_ref(),
            self.pool.thread_count(),
        );

        match self.run_loop() {
            Ok(()) => self.finish_simulation_run(STATUS_CODE_SUCCESS),
            Err(original) => {
                if let Err(cleanup) = self.finish_simulation_run(STATUS_CODE_ERROR) {
                    warn!(error = %cleanup, "secondary failure during cleanup after aborted run");
                }
                Err(original)
            }
        }
    }

    fn simulation_time(&self) -> i64 {
        self.core.clock()
    }

    fn end_time(&self) -> i64 {
        self.core.end_time()
    }

    fn next_event_timestamp(&self) -> Result<i64, SchedulerError> {
        self.core.next_event_timestamp()
    }

    fn start_watchdog(&mut self, sim_id: &str, max_idle: Duration) -> WatchdogHandle {
        self.core.start_watchdog(sim_id, max_idle)
    }

    fn finish_simulation_run(&mut self, status_code: i32) -> Result<(), SchedulerError> {
        // Workers are joined and the queue cleared before the shared
        // teardown runs, so no federate is mid-advance while finishing.
        self.pool.shutdown();
        self.core.clear_queue();
        self.core.finish_run(status_code)
    }
}
