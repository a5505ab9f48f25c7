//! Liveness monitoring parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Watchdog configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct WatchdogConfig {
    /// Seconds of scheduler silence after which a stall is reported.
    /// Zero disables the watchdog.
    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,

    /// TCP port for an out-of-process watchdog to connect to. Zero disables
    /// the external watchdog; the port is handed to the orchestrator, this
    /// core never opens it itself.
    #[serde(default)]
    pub external_port: u16,
}

fn default_max_idle_secs() -> u64 {
    30
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: default_max_idle_secs(),
            external_port: 0,
        }
    }
}
