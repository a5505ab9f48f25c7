//! Liveness monitoring of the scheduling loop.
//!
//! The scheduler reports its progress after every step; this thread only
//! notices when those reports stop coming. What happens on a stall is the
//! caller's decision via the stall handler - the core itself never kills
//! anything.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

struct WatchState {
    last_update: Instant,
    watching: bool,
}

struct Inner {
    state: Mutex<WatchState>,
    stop_signal: Condvar,
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to a running watchdog thread.
#[derive(Clone)]
pub struct WatchdogHandle {
    inner: Arc<Inner>,
}

impl WatchdogHandle {
    /// Spawns the watchdog. `on_stall` runs at most once, from the watchdog
    /// thread, if the scheduler stays silent for longer than `max_idle`.
    pub fn start<F>(sim_id: &str, max_idle: Duration, on_stall: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = Arc::new(Inner {
            state: Mutex::new(WatchState {
                last_update: Instant::now(),
                watching: true,
            }),
            stop_signal: Condvar::new(),
            thread: Mutex::new(None),
        });

        let thread_inner = Arc::clone(&inner);
        let sim_id = sim_id.to_owned();
        let handle = std::thread::Builder::new()
            .name(format!("watchdog-{sim_id}"))
            .spawn(move || watch(thread_inner, max_idle, on_stall))
            .expect("failed to spawn watchdog thread");

        *inner.thread.lock() = Some(handle);
        Self { inner }
    }

    /// Marks the scheduler as alive right now.
    pub fn update_current_time(&self) {
        self.inner.state.lock().last_update = Instant::now();
    }

    /// Stops the watchdog and waits for its thread to exit.
    pub fn stop_watching(&self) {
        {
            let mut state = self.inner.state.lock();
            state.watching = false;
        }
        self.inner.stop_signal.notify_all();
        if let Some(handle) = self.inner.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

fn watch<F>(inner: Arc<Inner>, max_idle: Duration, on_stall: F)
where
    F: FnOnce() + Send + 'static,
{
    let mut state = inner.state.lock();
    loop {
        if !state.watching {
            debug!("watchdog stopped");
            return;
        }
        inner.stop_signal.wait_for(&mut state, POLL_INTERVAL);
        if !state.watching {
            debug!("watchdog stopped");
            return;
        }
        let idle = state.last_update.elapsed();
        if idle > max_idle {
            drop(state);
            error!(
                idle_secs = idle.as_secs(),
                "one or more federates did not respond within the idle limit; \
                 this usually indicates an error inside a federate"
            );
            on_stall();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn stop_joins_without_firing() {
        let stalled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stalled);
        let watchdog = WatchdogHandle::start("test", Duration::from_secs(60), move || {
            flag.store(true, Ordering::SeqCst);
        });
        watchdog.update_current_time();
        watchdog.stop_watching();
        assert!(!stalled.load(Ordering::SeqCst));
    }
}
