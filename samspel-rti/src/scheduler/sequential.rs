//! Strictly serial run-loop strategy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use samspel_api::{FederateId, FederationRegistry, Monitor, SchedulerError};

use crate::perf::PerformanceTracker;
use crate::scheduler::{
    SchedulerCore, TimeManagement, TimeRequester, STATUS_CODE_ERROR, STATUS_CODE_SUCCESS,
};
use crate::throttle::RealtimeThrottle;
use crate::watchdog::WatchdogHandle;

/// Sequential time management: one federate advance at a time, in exact
/// time order. Total activation order equals time order, which makes runs
/// fully deterministic and reproducible.
pub struct SequentialScheduler {
    core: SchedulerCore,
    throttle: Option<RealtimeThrottle>,
}

impl SequentialScheduler {
    pub fn new(
        federation: Arc<dyn FederationRegistry>,
        monitor: Arc<dyn Monitor>,
        end_time: i64,
    ) -> Self {
        Self {
            core: SchedulerCore::new(federation, monitor, end_time),
            throttle: None,
        }
    }

    /// Enables wall-clock pacing. A factor of zero or below disables it.
    pub fn with_realtime_factor(mut self, factor: f64) -> Self {
        self.throttle = (factor > 0.0).then(|| RealtimeThrottle::new(factor));
        self
    }

    /// Handle federates use to file time requests during their advances.
    pub fn requester(&self) -> TimeRequester {
        self.core.requester()
    }

    fn run_loop(&mut self) -> Result<(), SchedulerError> {
        self.core.prepare_run()?;

        let mut perf = PerformanceTracker::new();

        while self.core.clock() < self.core.end_time() {
            let time = self.core.clock();
            if time > 0 {
                if let Some(throttle) = self.throttle.as_mut() {
                    throttle.sync(time);
                }
            }

            let event = match self.core.pop_event() {
                Some(event) if event.requested_time() <= self.core.end_time() => event,
                _ => {
                    // No causally relevant events remain; the run is over.
                    self.core.set_clock(self.core.end_time());
                    break;
                }
            };
            self.core.set_clock(event.requested_time());

            self.core.dispatch_direct(&event)?;

            // With an empty queue no other federate can produce an event
            // anymore, so the current one is flushed straight to the end.
            if self.core.queue_is_empty() {
                debug!(
                    end_time = self.core.end_time(),
                    "no pending events, flushing federate to end time"
                );
                self.flush_to_end(&event.federate().clone())?;
            }

            let now = Instant::now();
            let sample = perf.update(self.core.clock(), self.core.end_time(), now);
            self.core.report_progress(now, sample);
            self.core.update_watchdog();
        }

        Ok(())
    }

    fn flush_to_end(&self, federate_id: &FederateId) -> Result<(), SchedulerError> {
        let Some(federate) = self.core.federation().federate(federate_id) else {
            return Ok(());
        };
        federate
            .advance_time(self.core.end_time())
            .map_err(|source| SchedulerError::FederateFailure {
                federate: federate_id.clone(),
                source,
            })
    }
}

impl TimeManagement for SequentialScheduler {
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
        self.core
            .monitor()
            .on_begin_simulation(self.core.federation().as_ref(), 1);

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
        self.core.finish_run(status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use samspel_api::time::TIME_UNSET;
    use samspel_api::{Federate, FederateError, LocalFederation, NoopMonitor};

    #[derive(Default)]
    struct Recording {
        advances: Mutex<Vec<i64>>,
        finished: Mutex<u32>,
        fail_at: Option<i64>,
    }

    impl Recording {
        fn failing_at(time: i64) -> Self {
            Self {
                fail_at: Some(time),
                ..Default::default()
            }
        }
    }

    impl Federate for Recording {
        fn initialize(&self, _start_time: i64, _end_time: i64) -> Result<(), FederateError> {
            Ok(())
        }

        fn advance_time(&self, time: i64) -> Result<(), FederateError> {
            self.advances.lock().push(time);
            if self.fail_at == Some(time) {
                return Err(FederateError::Execution(format!("boom at {time}")));
            }
            Ok(())
        }

        fn finish_simulation(&self) -> Result<(), FederateError> {
            *self.finished.lock() += 1;
            Ok(())
        }
    }

    fn scheduler_with(
        federates: &[(&str, Arc<Recording>)],
        end_time: i64,
    ) -> SequentialScheduler {
        let federation = Arc::new(LocalFederation::new());
        for (id, federate) in federates {
            federation
                .join((*id).into(), Arc::clone(federate) as Arc<dyn Federate>)
                .unwrap();
        }
        SequentialScheduler::new(federation, Arc::new(NoopMonitor), end_time)
    }

    #[test]
    fn advances_in_time_order_to_end() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone())], 30);
        for time in [10, 20, 30] {
            scheduler
                .request_advance_time(&"f1".into(), time, 0, 50)
                .unwrap();
        }

        scheduler.run_simulation().unwrap();

        // The last pop drains the queue, so 30 is followed by the
        // flush-to-end advance to the same timestamp.
        assert_eq!(f1.advances.lock().as_slice(), &[10, 20, 30, 30]);
        assert_eq!(scheduler.simulation_time(), 30);
        assert_eq!(*f1.finished.lock(), 1);
    }

    #[test]
    fn clock_is_unset_before_run() {
        let f1 = Arc::new(Recording::default());
        let scheduler = scheduler_with(&[("f1", f1)], 30);
        assert_eq!(scheduler.simulation_time(), TIME_UNSET);
    }

    #[test]
    fn clock_never_decreases() {
        let f1 = Arc::new(Recording::default());
        let f2 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone()), ("f2", f2.clone())], 100);
        for (federate, time) in [("f1", 40), ("f2", 10), ("f1", 70), ("f2", 10)] {
            scheduler
                .request_advance_time(&federate.into(), time, 0, 50)
                .unwrap();
        }

        scheduler.run_simulation().unwrap();

        assert!(f1.advances.lock().windows(2).all(|w| w[0] <= w[1]));
        assert!(f2.advances.lock().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(scheduler.simulation_time(), 100);
    }

    #[test]
    fn past_time_request_is_rejected_and_queue_untouched() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone())], 30);
        scheduler
            .request_advance_time(&"f1".into(), 10, 0, 50)
            .unwrap();
        scheduler.run_simulation().unwrap();
        assert_eq!(scheduler.simulation_time(), 30);

        let result = scheduler.request_advance_time(&"f1".into(), 5, 0, 50);
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidTimeRequest { requested: 5, .. })
        ));
        assert!(scheduler.next_event_timestamp().is_err());
    }

    #[test]
    fn duplicate_requests_yield_one_advance() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone())], 10);
        scheduler
            .request_advance_time(&"f1".into(), 10, 5, 50)
            .unwrap();
        scheduler
            .request_advance_time(&"f1".into(), 10, 5, 50)
            .unwrap();

        scheduler.run_simulation().unwrap();

        assert_eq!(f1.advances.lock().iter().filter(|t| **t == 10).count(), 2);
        // One advance for the event plus the flush-to-end at the same time;
        // a retained duplicate would have produced a third call.
        assert_eq!(f1.advances.lock().len(), 2);
    }

    #[test]
    fn failing_federate_aborts_but_everyone_finishes() {
        let f1 = Arc::new(Recording::failing_at(10));
        let f2 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone()), ("f2", f2.clone())], 30);
        scheduler
            .request_advance_time(&"f1".into(), 10, 0, 50)
            .unwrap();
        scheduler
            .request_advance_time(&"f2".into(), 20, 0, 50)
            .unwrap();

        let result = scheduler.run_simulation();
        assert!(matches!(
            result,
            Err(SchedulerError::FederateFailure { .. })
        ));
        assert_eq!(*f1.finished.lock(), 1);
        assert_eq!(*f2.finished.lock(), 1);
        // f2 was never advanced: the run aborted before its event.
        assert!(f2.advances.lock().is_empty());
    }

    #[test]
    fn negative_end_time_is_rejected() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1)], -1);
        let result = scheduler.run_simulation();
        assert!(matches!(result, Err(SchedulerError::InvalidEndTime(-1))));
    }

    #[test]
    fn empty_queue_runs_straight_to_end() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone())], 50);
        scheduler.run_simulation().unwrap();
        assert_eq!(scheduler.simulation_time(), 50);
        assert!(f1.advances.lock().is_empty());
        assert_eq!(*f1.finished.lock(), 1);
    }

    #[test]
    fn events_beyond_end_time_are_not_dispatched() {
        let f1 = Arc::new(Recording::default());
        let mut scheduler = scheduler_with(&[("f1", f1.clone())], 30);
        scheduler
            .request_advance_time(&"f1".into(), 40, 0, 50)
            .unwrap();

        scheduler.run_simulation().unwrap();

        assert!(f1.advances.lock().is_empty());
        assert_eq!(scheduler.simulation_time(), 30);
    }
}
