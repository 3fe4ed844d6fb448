//! Periodic control loops and the tasks that feed them.
//!
//! Each loop owns its state and drives one synchronous `tick()` per period
//! of a tokio interval. Loops stop at the next tick boundary once the shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is cancelled.

pub mod depth_feed;
pub mod depth_loop;
pub mod stats;
pub mod thruster_loop;

pub use depth_feed::DepthFeed;
pub use depth_loop::DepthLoop;
pub use stats::LoopStats;
pub use thruster_loop::ThrusterLoop;

use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::controller::SamplerError;
use crate::mqtt::CommandPublisher;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Input device lost: {0}")]
    InputLost(#[from] SamplerError),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Long-running tasks of one process
pub type LoopTasks = JoinSet<Result<(), RuntimeError>>;

/// Waits for every task to finish.
///
/// The first failure cancels `shutdown`, so the remaining tasks wind down,
/// and is returned once they have.
pub async fn supervise(mut tasks: LoopTasks, shutdown: CancellationToken) -> Result<(), RuntimeError> {
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined
            .map_err(|e| RuntimeError::TaskFailed(e.to_string()))
            .and_then(|result| result);
        if let Err(e) = result {
            error!("{}", e);
            shutdown.cancel();
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Tick period for a loop running at `rate_hz`
pub fn period_from_rate(rate_hz: f64) -> Duration {
    Duration::from_secs_f64(1.0 / rate_hz)
}

// Overrunning ticks are skipped, not replayed in a burst
fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

// Returns whether the publish was handed to the transport
fn publish_logged<P: CommandPublisher + ?Sized>(publisher: &P, topic: &str, payload: String) -> bool {
    match publisher.publish(topic, payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use crate::mqtt::{CommandPublisher, TransportError};

    /// Keeps every publish in memory, in order
    #[derive(Clone, Default)]
    pub struct RecordingPublisher {
        published: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingPublisher {
        pub fn published(&self) -> Vec<(String, String)> {
            self.published.lock().unwrap().clone()
        }

        pub fn on_topic(&self, topic: &str) -> Vec<String> {
            self.published()
                .into_iter()
                .filter(|(t, _)| t == topic)
                .map(|(_, payload)| payload)
                .collect()
        }
    }

    impl CommandPublisher for RecordingPublisher {
        fn publish(&self, topic: &str, payload: String) -> Result<(), TransportError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    /// Rejects every publish the way a full client queue does
    pub struct FailingPublisher;

    impl CommandPublisher for FailingPublisher {
        fn publish(&self, topic: &str, _payload: String) -> Result<(), TransportError> {
            Err(TransportError::Publish {
                topic: topic.to_string(),
                source: rumqttc::ClientError::TryRequest(rumqttc::Request::PingReq(
                    rumqttc::PingReq,
                )),
            })
        }
    }
}
