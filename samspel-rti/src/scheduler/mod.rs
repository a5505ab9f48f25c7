//! Scheduler core shared by both run-loop strategies.

pub mod parallel;
pub mod sequential;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use samspel_api::time::{SECOND, TIME_UNSET};
use samspel_api::{
    FederateEvent, FederateId, FederationRegistry, Monitor, SchedulerError,
};

use crate::perf::{pretty_eta, PerformanceSample};
use crate::queue::EventQueue;
use crate::watchdog::WatchdogHandle;

/// Status code reported for a run that drained to its end time.
pub const STATUS_CODE_SUCCESS: i32 = 101;

/// Status code reported when a run was aborted by a failure.
pub const STATUS_CODE_ERROR: i32 = -1;

/// Minimum wall-clock gap between two progress log lines.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_millis(500);

/// Surface the surrounding orchestrator drives a scheduler through.
pub trait TimeManagement {
    /// Files a federate's request to advance to `time`. Fails with
    /// [`SchedulerError::InvalidTimeRequest`] when `time` lies before the
    /// current clock; identical pending requests coalesce.
    fn request_advance_time(
        &self,
        federate: &FederateId,
        time: i64,
        lookahead: i64,
        priority: u8,
    ) -> Result<(), SchedulerError>;

    /// Drains the event queue until it is empty or the end time is reached.
    /// On failure the cleanup phase still runs before the original error is
    /// returned.
    fn run_simulation(&mut self) -> Result<(), SchedulerError>;

    /// Current simulation time; [`TIME_UNSET`] before the run starts.
    fn simulation_time(&self) -> i64;

    fn end_time(&self) -> i64;

    /// Requested time of the next pending event.
    fn next_event_timestamp(&self) -> Result<i64, SchedulerError>;

    /// Starts liveness monitoring for this run.
    fn start_watchdog(&mut self, sim_id: &str, max_idle: Duration) -> WatchdogHandle;

    /// Best-effort cleanup: stops the watchdog, finishes every federate
    /// regardless of individual failures, prints the run summary and
    /// notifies the monitor. Returns the first federate finish failure.
    fn finish_simulation_run(&mut self, status_code: i32) -> Result<(), SchedulerError>;
}

/// State shared between the scheduling thread and anything filing time
/// requests concurrently (workers, federate integration layers).
struct SchedulerShared {
    queue: EventQueue,
    clock: AtomicI64,
}

/// Cloneable handle through which federates request time advances from
/// worker threads while a batch is in flight.
#[derive(Clone)]
pub struct TimeRequester {
    shared: Arc<SchedulerShared>,
}

impl TimeRequester {
    pub fn request_advance_time(
        &self,
        federate: &FederateId,
        time: i64,
        lookahead: i64,
        priority: u8,
    ) -> Result<(), SchedulerError> {
        let current = self.shared.clock.load(Ordering::Acquire);
        if time < current {
            return Err(SchedulerError::InvalidTimeRequest {
                federate: federate.clone(),
                requested: time,
                current,
            });
        }
        self.shared
            .queue
            .insert(FederateEvent::new(federate.clone(), time, lookahead, priority));
        Ok(())
    }
}

/// Run-loop-independent scheduler state: queue, clock, federation access,
/// watchdog and progress bookkeeping.
pub(crate) struct SchedulerCore {
    shared: Arc<SchedulerShared>,
    federation: Arc<dyn FederationRegistry>,
    monitor: Arc<dyn Monitor>,
    end_time: i64,
    watchdog: Option<WatchdogHandle>,
    run_started: Option<Instant>,
    last_progress_log: Option<Instant>,
}

impl SchedulerCore {
    pub(crate) fn new(
        federation: Arc<dyn FederationRegistry>,
        monitor: Arc<dyn Monitor>,
        end_time: i64,
    ) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                queue: EventQueue::new(),
                clock: AtomicI64::new(TIME_UNSET),
            }),
            federation,
            monitor,
            end_time,
            watchdog: None,
            run_started: None,
            last_progress_log: None,
        }
    }

    pub(crate) fn requester(&self) -> TimeRequester {
        TimeRequester {
            shared: Arc::clone(&self.shared),
        }
    }

    pub(crate) fn federation(&self) -> &Arc<dyn FederationRegistry> {
        &self.federation
    }

    pub(crate) fn monitor(&self) -> &Arc<dyn Monitor> {
        &self.monitor
    }

    pub(crate) fn clock(&self) -> i64 {
        self.shared.clock.load(Ordering::Acquire)
    }

    /// Advances the global clock. The clock never moves backwards; events
    /// are consumed in time order and past-time requests are rejected.
    pub(crate) fn set_clock(&self, time: i64) {
        debug_assert!(time >= self.clock());
        self.shared.clock.store(time, Ordering::Release);
    }

    pub(crate) fn end_time(&self) -> i64 {
        self.end_time
    }

    pub(crate) fn pop_event(&self) -> Option<FederateEvent> {
        self.shared.queue.pop()
    }

    pub(crate) fn peek_event(&self) -> Option<FederateEvent> {
        self.shared.queue.peek()
    }

    pub(crate) fn queue_is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }

    pub(crate) fn clear_queue(&self) {
        self.shared.queue.clear()
    }

    pub(crate) fn next_event_timestamp(&self) -> Result<i64, SchedulerError> {
        self.shared
            .queue
            .peek()
            .map(|event| event.requested_time())
            .ok_or(SchedulerError::EmptyQueue)
    }

    /// Validates parameters, resets the clock to the start time and fans the
    /// initialize call out to every federate.
    pub(crate) fn prepare_run(&mut self) -> Result<(), SchedulerError> {
        if self.end_time < 0 {
            return Err(SchedulerError::InvalidEndTime(self.end_time));
        }

        self.shared.clock.store(0, Ordering::Release);

        for (id, federate) in self.federation.federates() {
            federate
                .initialize(0, self.end_time)
                .map_err(|source| SchedulerError::FederateFailure {
                    federate: id,
                    source,
                })?;
        }

        self.run_started = Some(Instant::now());
        Ok(())
    }

    pub(crate) fn start_watchdog(&mut self, sim_id: &str, max_idle: Duration) -> WatchdogHandle {
        let watchdog = WatchdogHandle::start(sim_id, max_idle, || {
            error!("simulation stalled; aborting is left to the orchestrator");
        });
        self.watchdog = Some(watchdog.clone());
        watchdog
    }

    pub(crate) fn update_watchdog(&self) {
        if let Some(watchdog) = &self.watchdog {
            watchdog.update_current_time();
        }
    }

    /// Best-effort teardown shared by both strategies. Every federate's
    /// `finish_simulation` runs even when earlier ones fail; the first
    /// failure is returned only after the summary was printed and the
    /// monitor notified.
    pub(crate) fn finish_run(&mut self, status_code: i32) -> Result<(), SchedulerError> {
        let duration = self
            .run_started
            .map(|started| started.elapsed())
            .unwrap_or_default();

        if let Some(watchdog) = self.watchdog.take() {
            watchdog.stop_watching();
        }

        let mut first_failure = None;
        for (id, federate) in self.federation.federates() {
            if let Err(source) = federate.finish_simulation() {
                error!(federate = %id, error = %source, "federate failed to finish");
                if first_failure.is_none() {
                    first_failure = Some(SchedulerError::FederateFailure {
                        federate: id,
                        source,
                    });
                }
            }
        }

        self.log_run_summary(duration, status_code);
        self.monitor.on_end_simulation(duration, status_code);

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn log_run_summary(&self, duration: Duration, status_code: i32) {
        let time = self.clock().max(0);
        let percent = if self.end_time > 0 {
            (time as f64 * 100.0) / self.end_time as f64
        } else {
            100.0
        };
        info!(
            "Simulation ended after {}s of {}s ({percent:.1}%)",
            time / SECOND,
            self.end_time / SECOND
        );

        let ended = chrono::Local::now();
        let started = ended - chrono::Duration::milliseconds(duration.as_millis() as i64);
        info!("Started: {}", started.format("%Y-%m-%d %H:%M:%S"));
        info!("Ended: {}", ended.format("%Y-%m-%d %H:%M:%S"));

        let rtf = if duration.as_nanos() > 0 {
            time as f64 / duration.as_nanos() as f64
        } else {
            0.0
        };
        info!("Duration: {:.3}s (RTF: {rtf:.2})", duration.as_secs_f64());

        if status_code == STATUS_CODE_SUCCESS {
            info!("Simulation finished: {status_code}");
        } else {
            info!("Simulation interrupted: {status_code}");
        }
    }

    /// Rate-limited progress line; one every 500 ms at most.
    pub(crate) fn report_progress(&mut self, now: Instant, sample: PerformanceSample) {
        let due = match self.last_progress_log {
            Some(last) => now.duration_since(last) > PROGRESS_LOG_INTERVAL,
            None => true,
        };
        if !due {
            return;
        }
        self.last_progress_log = Some(now);

        let time = self.clock();
        let percent = if self.end_time > 0 {
            (time as f64 * 100.0) / self.end_time as f64
        } else {
            100.0
        };
        info!(
            target: "simulation_progress",
            "Simulating: {time}ns ({:.1}s / {:.1}s) - {percent:.1}% (RTF: {:.2}, ETC: {})",
            time as f64 / SECOND as f64,
            self.end_time as f64 / SECOND as f64,
            sample.realtime_factor,
            pretty_eta(sample.eta_seconds)
        );
    }

    /// Dispatches one event synchronously on the calling thread, with
    /// monitor hooks around the advance.
    pub(crate) fn dispatch_direct(&self, event: &FederateEvent) -> Result<(), SchedulerError> {
        let Some(federate) = self.federation.federate(event.federate()) else {
            warn!(federate = %event.federate(), "event targets an unknown federate");
            return Ok(());
        };
        debug!(federate = %event.federate(), time = event.requested_time(), "advancing");

        self.monitor.on_begin_activity(event);
        let started = Instant::now();
        let result = federate.advance_time(event.requested_time());
        self.monitor.on_end_activity(event, started.elapsed());

        result.map_err(|source| SchedulerError::FederateFailure {
            federate: event.federate().clone(),
            source,
        })
    }
}
