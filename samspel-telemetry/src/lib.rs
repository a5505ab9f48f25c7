//! # samspel-telemetry
//!
//! Logging and metrics for the co-simulation runtime. Scheduling correctness
//! never depends on anything in this crate.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
