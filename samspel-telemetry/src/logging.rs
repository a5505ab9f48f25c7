//! Structured logging with tracing.

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` overrides the default
    /// `info` filter.
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .init()
    }

    /// Records a runtime event with structured metadata.
    pub fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "runtime_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        span.in_scope(|| {
            tracing::info!(metadata = ?metadata, "Runtime event occurred");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn log_event_is_recorded() {
        EventLogger::log_event("test", vec![KeyValue::new("key", "value")]);
        assert!(logs_contain("Runtime event occurred"));
    }
}
