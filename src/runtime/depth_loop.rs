use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::stats::LoopStats;
use super::{publish_logged, ticker};
use crate::depth::{compute_tick, DepthCorrection, DepthMode, DepthReader, PidState};
use crate::mqtt::{format_correction, CommandPublisher};

/// Depth-hold loop for a setpoint fixed at startup.
///
/// Reads the latest depth once per tick and publishes the normalized PID
/// correction whether or not the target has been reached.
pub struct DepthLoop<P> {
    setpoint: f64,
    reader: DepthReader,
    publisher: P,
    topic: String,
    pid: PidState,
    stats: LoopStats,
}

impl<P: CommandPublisher> DepthLoop<P> {
    pub fn new(setpoint: f64, reader: DepthReader, publisher: P, topic: impl Into<String>) -> Self {
        Self {
            setpoint,
            reader,
            publisher,
            topic: topic.into(),
            pid: PidState::default(),
            stats: LoopStats::new("Depth loop"),
        }
    }

    pub fn pid_state(&self) -> &PidState {
        &self.pid
    }

    pub fn tick(&mut self) -> DepthCorrection {
        let started = Instant::now();
        let depth = self.reader.latest();

        let pid = std::mem::take(&mut self.pid);
        let (correction, pid) = compute_tick(self.setpoint, depth, pid);
        self.pid = pid;

        let published = publish_logged(
            &self.publisher,
            &self.topic,
            format_correction(correction.normalized_output),
        );

        match correction.mode() {
            DepthMode::Holding => info!("Reached target depth. Thrusters neutralized."),
            DepthMode::Seeking => info!("Depth control active."),
        }
        info!("Normalized PID Value: {:.6}", correction.normalized_output);

        self.stats
            .record_tick(started.elapsed(), usize::from(!published));
        correction
    }

    pub async fn run(mut self, period: Duration, shutdown: CancellationToken) {
        info!(
            "Depth loop holding {:.2} m, running every {:?}",
            self.setpoint, period
        );
        let mut ticker = ticker(period);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }

        info!("Depth loop stopped after {} ticks", self.stats.total_ticks());
    }
}
