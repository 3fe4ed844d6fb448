use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info};

// Time between throughput reports
const LOG_INTERVAL_SECONDS: i64 = 30;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TickMetrics {
    ticks: u64,
    publish_failures: u64,
    slowest_tick: Duration,
}

/// Per-loop throughput counters, reported and reset every 30 seconds
#[derive(Debug)]
pub struct LoopStats {
    name: &'static str,
    metrics: TickMetrics,
    total_ticks: u64,
    last_log_time: DateTime<Local>,
    log_interval: chrono::Duration,
}

impl LoopStats {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            metrics: TickMetrics::default(),
            total_ticks: 0,
            last_log_time: Local::now(),
            log_interval: chrono::Duration::seconds(LOG_INTERVAL_SECONDS),
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn record_tick(&mut self, elapsed: Duration, publish_failures: usize) {
        self.total_ticks += 1;
        self.metrics.ticks += 1;
        self.metrics.publish_failures += publish_failures as u64;
        self.metrics.slowest_tick = self.metrics.slowest_tick.max(elapsed);
        self.log_if_due(Local::now());
    }

    /// Returns true when a report was written
    fn log_if_due(&mut self, now: DateTime<Local>) -> bool {
        if now - self.last_log_time < self.log_interval {
            return false;
        }

        let seconds = (now - self.last_log_time).num_milliseconds() as f64 / 1000.0;
        info!(
            "{} stats: {} ticks in last {:.0} seconds (avg {:.2}/sec), {} failed publishes",
            self.name,
            self.metrics.ticks,
            seconds,
            self.metrics.ticks as f64 / seconds,
            self.metrics.publish_failures
        );
        debug!(
            "{} slowest tick: {:.3}ms",
            self.name,
            self.metrics.slowest_tick.as_micros() as f64 / 1000.0
        );

        self.metrics = TickMetrics::default();
        self.last_log_time = now;
        true
    }
}
