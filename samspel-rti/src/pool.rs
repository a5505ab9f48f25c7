//! Worker pool for parallel event dispatch.
//!
//! One [`ScheduledBatch`] is shared between the scheduling thread and a
//! fixed set of workers. The scheduling thread fills it with the events of
//! one round; workers drain it as it fills and signal the idle condvar once
//! the queue is empty and no worker is mid-advance. The first failure of a
//! round is kept, later ones in the same round are dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use samspel_api::{FederateEvent, FederationRegistry, Monitor, SchedulerError};

struct BatchState {
    queue: VecDeque<FederateEvent>,
    active: usize,
    /// Minimum of `requested_time + lookahead` over every event of the
    /// current round, including those already handed to workers.
    horizon: i64,
    shutdown: bool,
    failure: Option<SchedulerError>,
}

/// Shared buffer holding the events of the round currently in flight.
pub struct ScheduledBatch {
    state: Mutex<BatchState>,
    work_ready: Condvar,
    idle: Condvar,
}

impl Default for ScheduledBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduledBatch {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchState {
                queue: VecDeque::new(),
                active: 0,
                horizon: i64::MAX,
                shutdown: false,
                failure: None,
            }),
            work_ready: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    /// Resets the batch horizon for a fresh round.
    pub fn begin_round(&self) {
        self.state.lock().horizon = i64::MAX;
    }

    /// Adds an event to the in-flight round and wakes one worker.
    pub fn push(&self, event: FederateEvent) {
        let mut state = self.state.lock();
        state.horizon = state
            .horizon
            .min(event.requested_time() + event.lookahead());
        state.queue.push_back(event);
        drop(state);
        self.work_ready.notify_one();
    }

    /// The current batch horizon: no event at or below this time can be
    /// causally affected by any event of the round.
    pub fn horizon(&self) -> i64 {
        self.state.lock().horizon
    }

    /// Blocks the scheduling thread until the round has fully completed.
    pub fn wait_idle(&self) {
        let mut state = self.state.lock();
        while state.active > 0 || !state.queue.is_empty() {
            self.idle.wait(&mut state);
        }
    }

    /// Takes the first failure recorded during the last round, if any.
    pub fn take_failure(&self) -> Option<SchedulerError> {
        self.state.lock().failure.take()
    }

    fn next_task(&self) -> Option<FederateEvent> {
        let mut state = self.state.lock();
        loop {
            if let Some(event) = state.queue.pop_front() {
                state.active += 1;
                return Some(event);
            }
            if state.shutdown {
                return None;
            }
            self.work_ready.wait(&mut state);
        }
    }

    fn task_done(&self, failure: Option<SchedulerError>) {
        let mut state = self.state.lock();
        state.active -= 1;
        if let Some(failure) = failure {
            if state.failure.is_none() {
                state.failure = Some(failure);
            } else {
                // First failure wins; this one is only logged.
                warn!(error = %failure, "dropping subsequent worker failure in the same round");
            }
        }
        if state.active == 0 && state.queue.is_empty() {
            self.idle.notify_all();
        }
    }

    fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.work_ready.notify_all();
    }
}

/// Fixed-size pool of worker threads executing federate advances.
pub struct WorkerPool {
    batch: Arc<ScheduledBatch>,
    federation: Arc<dyn FederationRegistry>,
    monitor: Arc<dyn Monitor>,
    thread_count: usize,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(
        federation: Arc<dyn FederationRegistry>,
        monitor: Arc<dyn Monitor>,
        thread_count: usize,
    ) -> Self {
        Self {
            batch: Arc::new(ScheduledBatch::new()),
            federation,
            monitor,
            thread_count: thread_count.max(1),
            workers: Vec::new(),
        }
    }

    pub fn batch(&self) -> &ScheduledBatch {
        &self.batch
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Spawns the workers. Idempotent only before `shutdown`.
    pub fn start(&mut self) {
        for index in 1..=self.thread_count {
            let batch = Arc::clone(&self.batch);
            let federation = Arc::clone(&self.federation);
            let monitor = Arc::clone(&self.monitor);
            let handle = std::thread::Builder::new()
                .name(format!("worker-{index:02}"))
                .spawn(move || worker_loop(batch, federation, monitor))
                .expect("failed to spawn worker thread");
            self.workers.push(handle);
        }
    }

    /// Signals all workers to stop and joins them.
    pub fn shutdown(&mut self) {
        self.batch.shutdown();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    batch: Arc<ScheduledBatch>,
    federation: Arc<dyn FederationRegistry>,
    monitor: Arc<dyn Monitor>,
) {
    while let Some(event) = batch.next_task() {
        let failure = advance(&*federation, &*monitor, &event).err();
        batch.task_done(failure);
    }
    debug!("worker shut down");
}

fn advance(
    federation: &dyn FederationRegistry,
    monitor: &dyn Monitor,
    event: &FederateEvent,
) -> Result<(), SchedulerError> {
    let Some(federate) = federation.federate(event.federate()) else {
        warn!(federate = %event.federate(), "event targets an unknown federate");
        return Ok(());
    };
    monitor.on_begin_activity(event);
    let started = Instant::now();
    let result = federate.advance_time(event.requested_time());
    monitor.on_end_activity(event, started.elapsed());
    result.map_err(|source| SchedulerError::WorkerFailure {
        federate: event.federate().clone(),
        source,
    })
}
