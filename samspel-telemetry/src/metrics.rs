//! Prometheus metrics for scheduling activity.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

/// Counters and histograms observed by the activity monitor.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub scheduled_events: Counter,
    pub advance_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let scheduled_events =
            Counter::new("samspel_events_total", "Total dispatched federate events")
                .expect("static metric definition");

        let advance_latency = Histogram::with_opts(
            HistogramOpts::new(
                "samspel_advance_latency_ns",
                "Wall-clock duration of federate advance_time calls",
            )
            .buckets(vec![10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0, 100_000_000.0]),
        )
        .expect("static metric definition");

        registry
            .register(Box::new(scheduled_events.clone()))
            .expect("fresh registry");
        registry
            .register(Box::new(advance_latency.clone()))
            .expect("fresh registry");

        Self {
            registry,
            scheduled_events,
            advance_latency,
        }
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_gathers() {
        let metrics = MetricsRecorder::new();
        metrics.scheduled_events.inc();
        metrics.advance_latency.observe(25_000.0);
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("samspel_events_total"));
    }
}
