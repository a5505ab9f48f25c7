//! Wall-clock pacing for simulation runs.

use std::time::{Duration, Instant};

use samspel_api::time::MILLI_SECOND;

/// Source of wall-clock time, injectable for tests.
pub trait WallClock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The real wall clock.
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Throttles the run loop so simulation time tracks the wall clock.
///
/// `factor` is the targeted ratio of simulation time to wall-clock time:
/// `1.0` paces the run 1:1 with real time, `2.0` lets simulation time pass
/// twice as fast as the wall clock. A factor of zero or below disables
/// pacing entirely.
pub struct RealtimeThrottle<C: WallClock = SystemClock> {
    factor: f64,
    last_sim_time: i64,
    last_wall: Option<Instant>,
    /// Sub-increment sleep debt carried between calls to avoid drift.
    carry_ns: i64,
    clock: C,
}

/// Sleep granularity. Anything owed below this is carried forward.
const SLEEP_INCREMENT_NS: i64 = MILLI_SECOND;

/// Bound on accumulated catch-up debt when the simulation runs behind.
const MAX_DEBT_NS: i64 = -1_000_000_000;

impl RealtimeThrottle<SystemClock> {
    pub fn new(factor: f64) -> Self {
        Self::with_clock(factor, SystemClock)
    }
}

impl<C: WallClock> RealtimeThrottle<C> {
    pub fn with_clock(factor: f64, clock: C) -> Self {
        Self {
            factor,
            last_sim_time: 0,
            last_wall: None,
            carry_ns: 0,
            clock,
        }
    }

    /// Call once per completed step with the current simulation time.
    ///
    /// Sleeps however long is needed for the wall clock to catch up with the
    /// simulation time elapsed since the previous call, divided by the
    /// configured factor. Sleeps happen in whole-millisecond increments; the
    /// remainder is carried into the next call.
    pub fn sync(&mut self, sim_time: i64) {
        if self.factor <= 0.0 {
            return;
        }

        let now = self.clock.now();
        let Some(last_wall) = self.last_wall else {
            self.last_wall = Some(now);
            self.last_sim_time = sim_time;
            return;
        };

        let sim_delta = (sim_time - self.last_sim_time).max(0);
        let target_ns = (sim_delta as f64 / self.factor) as i64;
        let elapsed_ns = now.duration_since(last_wall).as_nanos() as i64;

        let mut pending = target_ns - elapsed_ns + self.carry_ns;
        let mut resumed = now;
        if pending >= SLEEP_INCREMENT_NS {
            let whole_millis = pending / SLEEP_INCREMENT_NS;
            self.clock
                .sleep(Duration::from_millis(whole_millis as u64));
            pending -= whole_millis * SLEEP_INCREMENT_NS;
            // Re-read so the sleep is not credited against the next interval.
            resumed = self.clock.now();
        }
        self.carry_ns = pending.max(MAX_DEBT_NS);

        self.last_wall = Some(resumed);
        self.last_sim_time = sim_time;
    }
}
