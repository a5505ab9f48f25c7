//! Scheduler parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Which run-loop strategy drives the federation forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStrategy {
    Sequential,
    Parallel,
}

/// Time-management configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SchedulerConfig {
    /// Simulation end time in [ns].
    #[serde(default = "default_end_time")]
    #[validate(range(min = 0))]
    pub end_time: i64,

    /// Number of worker threads used by the parallel strategy.
    #[serde(default = "default_threads")]
    #[validate(range(min = 1))]
    pub threads: usize,

    /// Target ratio of simulation time to wall-clock time. `1.0` paces the
    /// run 1:1 with the wall clock, `2.0` twice as fast. Zero or negative
    /// disables pacing.
    #[serde(default)]
    pub realtime_factor: f64,

    /// Run-loop strategy (`sequential` or `parallel`).
    #[serde(default = "default_strategy")]
    #[validate(custom(function = validation::validate_strategy))]
    pub strategy: String,
}

fn default_end_time() -> i64 {
    0
}

fn default_threads() -> usize {
    num_cpus::get()
}

fn default_strategy() -> String {
    "sequential".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            end_time: default_end_time(),
            threads: default_threads(),
            realtime_factor: 0.0,
            strategy: default_strategy(),
        }
    }
}

impl SchedulerConfig {
    /// Parsed form of the validated `strategy` field.
    pub fn strategy(&self) -> SchedulingStrategy {
        match self.strategy.as_str() {
            "parallel" => SchedulingStrategy::Parallel,
            _ => SchedulingStrategy::Sequential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_strategy() {
        let config = SchedulerConfig {
            strategy: "speculative".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_parallel_strategy() {
        let config = SchedulerConfig {
            strategy: "parallel".into(),
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.strategy(), SchedulingStrategy::Parallel);
    }
}
