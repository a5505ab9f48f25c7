//! Rolling performance estimates for progress reporting.
//!
//! Nothing here feeds back into scheduling decisions; a wrong estimate can
//! only ever produce a wrong progress line.

use std::time::Instant;

use samspel_api::time::SECOND;

/// Wall-clock span over which the realtime factor is averaged.
const SAMPLING_WINDOW_NS: i64 = 5 * SECOND;

/// ETA beyond this is reported as unknown.
const MAX_KNOWN_ETA_SECS: f64 = 3600.0 * 24.0 * 365.0 * 100.0;

/// Snapshot of the current performance estimate.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceSample {
    /// Average simulated ns per wall-clock ns over the last window.
    pub realtime_factor: f64,
    /// Estimated wall-clock seconds to completion; negative means unknown.
    pub eta_seconds: f64,
}

impl Default for PerformanceSample {
    fn default() -> Self {
        Self {
            realtime_factor: 0.0,
            eta_seconds: -1.0,
        }
    }
}

/// Accumulates sim-time and wall-time deltas and recomputes the estimate
/// once enough wall time has passed.
pub struct PerformanceTracker {
    window_sim_ns: f64,
    window_wall_ns: i64,
    last_sim_time: i64,
    last_wall: Option<Instant>,
    current: PerformanceSample,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            window_sim_ns: 0.0,
            window_wall_ns: 0,
            last_sim_time: 0,
            last_wall: None,
            current: PerformanceSample::default(),
        }
    }

    /// Feed one completed step; returns the current (possibly unchanged)
    /// estimate.
    pub fn update(&mut self, sim_time: i64, end_time: i64, wall_now: Instant) -> PerformanceSample {
        if let Some(last_wall) = self.last_wall {
            self.window_wall_ns += wall_now.duration_since(last_wall).as_nanos() as i64;
        }
        self.last_wall = Some(wall_now);

        self.window_sim_ns += (sim_time - self.last_sim_time) as f64;
        self.last_sim_time = sim_time;

        if self.window_wall_ns > SAMPLING_WINDOW_NS {
            let realtime_factor = self.window_sim_ns / self.window_wall_ns as f64;
            let remaining = (end_time - sim_time) as f64 / SECOND as f64;
            let mut eta_seconds = if realtime_factor > 0.0 {
                remaining / realtime_factor
            } else {
                -1.0
            };
            if eta_seconds > MAX_KNOWN_ETA_SECS {
                eta_seconds = -1.0;
            }
            self.current = PerformanceSample {
                realtime_factor,
                eta_seconds,
            };
            self.window_sim_ns = 0.0;
            self.window_wall_ns = 0;
        }
        self.current
    }
}

/// Formats an ETA in the coarsest readable unit.
pub fn pretty_eta(seconds: f64) -> String {
    if seconds < 0.0 {
        "unknown".to_string()
    } else if seconds < 120.0 {
        format!("{seconds:.1}s")
    } else if seconds < 7200.0 {
        format!("{:.1}m", seconds / 60.0)
    } else if seconds < 48.0 * 3600.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds < 3600.0 * 24.0 * 60.0 {
        format!("{:.1}d", seconds / (3600.0 * 24.0))
    } else if seconds < 3600.0 * 24.0 * 720.0 {
        format!("{:.1}mo", seconds / (3600.0 * 24.0 * 30.0))
    } else {
        format!("{:.1}y", seconds / (3600.0 * 24.0 * 365.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn estimate_appears_after_the_window_fills() {
        let mut tracker = PerformanceTracker::new();
        let start = Instant::now();

        let sample = tracker.update(0, 100 * SECOND, start);
        assert!(sample.eta_seconds < 0.0, "no estimate before window fills");

        // Six wall seconds for five simulated seconds: RTF below 1.
        let sample = tracker.update(5 * SECOND, 100 * SECOND, start + Duration::from_secs(6));
        assert!(sample.realtime_factor > 0.7 && sample.realtime_factor < 1.0);
        assert!(sample.eta_seconds > 0.0);
    }

    #[test]
    fn absurd_eta_is_unknown() {
        let mut tracker = PerformanceTracker::new();
        let start = Instant::now();
        tracker.update(0, i64::MAX, start);
        let sample = tracker.update(1, i64::MAX, start + Duration::from_secs(6));
        assert!(sample.eta_seconds < 0.0);
    }

    #[test]
    fn pretty_eta_units() {
        assert_eq!(pretty_eta(-1.0), "unknown");
        assert_eq!(pretty_eta(90.0), "90.0s");
        assert_eq!(pretty_eta(600.0), "10.0m");
        assert_eq!(pretty_eta(10_800.0), "3.0h");
    }
}
