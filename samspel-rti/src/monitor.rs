//! Activity logging monitor.
//!
//! Emits one structured line per scheduling observation (`SIM`, `FED`,
//! `EVT`, `PRL` records) and feeds the metrics recorder. Purely an
//! observer: errors or slow sinks here must never influence scheduling.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use samspel_api::{FederateEvent, FederateId, FederationRegistry, Monitor};
use samspel_telemetry::MetricsRecorder;

#[derive(Default)]
struct ActivityStats {
    total: Duration,
    count: u64,
}

/// Monitor that logs every scheduling event and aggregates per-federate
/// activity durations for an end-of-run statistics block.
pub struct ActivityLogger {
    metrics: MetricsRecorder,
    stats: Mutex<HashMap<FederateId, ActivityStats>>,
}

impl Default for ActivityLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLogger {
    pub fn new() -> Self {
        Self {
            metrics: MetricsRecorder::new(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }
}

impl Monitor for ActivityLogger {
    fn on_begin_simulation(&self, federation: &dyn FederationRegistry, thread_count: usize) {
        info!(target: "activity", "SIM;0;threads={thread_count}");
        for (id, federate) in federation.federates() {
            info!(
                target: "activity",
                "FED;{id};constrained={};regulating={}",
                federate.is_time_constrained(),
                federate.is_time_regulating()
            );
        }
    }

    fn on_scheduling(&self, round: u64, event: &FederateEvent) {
        info!(
            target: "activity",
            "PRL;{round};{};{};{};{}",
            event.id(),
            event.federate(),
            event.requested_time(),
            event.lookahead()
        );
    }

    fn on_begin_activity(&self, event: &FederateEvent) {
        info!(
            target: "activity",
            "EVT;{};{};id={}",
            event.requested_time(),
            event.federate(),
            event.id()
        );
    }

    fn on_end_activity(&self, event: &FederateEvent, duration: Duration) {
        self.metrics.scheduled_events.inc();
        self.metrics
            .advance_latency
            .observe(duration.as_nanos() as f64);

        let mut stats = self.stats.lock();
        let entry = stats.entry(event.federate().clone()).or_default();
        entry.total += duration;
        entry.count += 1;

        info!(
            target: "activity",
            "EVT;{};{};D:{};id={}",
            event.requested_time(),
            event.federate(),
            duration.as_nanos(),
            event.id()
        );
    }

    fn on_end_simulation(&self, duration: Duration, status_code: i32) {
        info!(
            target: "activity",
            "SIM;end;D:{};status={status_code}",
            duration.as_millis()
        );
        info!(target: "activity", "Federate;avgActivityNs;activities");
        let stats = self.stats.lock();
        for (federate, stat) in stats.iter() {
            let avg = if stat.count > 0 {
                stat.total.as_nanos() / u128::from(stat.count)
            } else {
                0
            };
            info!(target: "activity", "{federate};{avg};{}", stat.count);
        }
    }
}
