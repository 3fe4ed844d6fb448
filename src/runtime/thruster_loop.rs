use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::stats::LoopStats;
use super::{publish_logged, ticker};
use crate::controller::{InputSampler, SamplerError};
use crate::mapping::{compute_tick, LightState, MappedCommands};
use crate::mqtt::{format_group, CommandPublisher, TopicConfig};

/// Joystick to thruster/light loop.
///
/// Owns the light state for its whole lifetime; every tick samples the
/// gamepad once and publishes the horizontal, vertical and light commands.
pub struct ThrusterLoop<P> {
    sampler: InputSampler,
    publisher: P,
    topics: TopicConfig,
    light: LightState,
    stats: LoopStats,
}

impl<P: CommandPublisher> ThrusterLoop<P> {
    pub fn new(sampler: InputSampler, publisher: P, topics: TopicConfig) -> Self {
        Self {
            sampler,
            publisher,
            topics,
            light: LightState::default(),
            stats: LoopStats::new("Thruster loop"),
        }
    }

    pub fn light(&self) -> LightState {
        self.light
    }

    /// Runs one mapping tick and publishes its commands.
    ///
    /// Publish failures are logged; the light state advances regardless.
    pub fn tick(&mut self) -> Result<MappedCommands, SamplerError> {
        let started = Instant::now();
        let snapshot = self.sampler.sample()?;

        let (commands, light) = compute_tick(&snapshot.joystick, &snapshot.button_events, self.light);
        if light != self.light {
            debug!(
                "Light {} at {}",
                if light.is_on() { "on" } else { "off" },
                light.level()
            );
        }
        self.light = light;

        let horizontal = format_group(&commands.thrusters.horizontal());
        let vertical = format_group(&commands.thrusters.vertical());
        let light_level = commands.light_level.to_string();
        info!(
            "Published Horizontal: {}, Vertical: {}, Light: {}",
            horizontal, vertical, light_level
        );

        let failures = [
            (self.topics.horizontal.as_str(), horizontal),
            (self.topics.vertical.as_str(), vertical),
            (self.topics.light.as_str(), light_level),
        ]
        .into_iter()
        .map(|(topic, payload)| publish_logged(&self.publisher, topic, payload))
        .filter(|published| !published)
        .count();

        self.stats.record_tick(started.elapsed(), failures);
        Ok(commands)
    }

    /// Ticks every `period` until `shutdown` is cancelled.
    ///
    /// Losing the gamepad event stream ends the loop with an error unless a
    /// shutdown is already under way.
    pub async fn run(mut self, period: Duration, shutdown: CancellationToken) -> Result<(), SamplerError> {
        info!("Thruster loop running every {:?}", period);
        let mut ticker = ticker(period);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick() {
                        if shutdown.is_cancelled() {
                            break;
                        }
                        return Err(e);
                    }
                }
            }
        }

        info!("Thruster loop stopped after {} ticks", self.stats.total_ticks());
        Ok(())
    }
}
