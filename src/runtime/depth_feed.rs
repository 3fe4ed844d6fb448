use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::depth::{parse_depth_record, DepthWriter};
use crate::mqtt::MqttMessage;

/// Writes depth readings from the sensor topic into the latest-value register
pub struct DepthFeed {
    messages: mpsc::Receiver<MqttMessage>,
    writer: DepthWriter,
    accepted: u64,
    rejected: u64,
}

impl DepthFeed {
    pub fn new(messages: mpsc::Receiver<MqttMessage>, writer: DepthWriter) -> Self {
        Self {
            messages,
            writer,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Stores the reading carried by `message`; malformed records leave the
    /// register untouched.
    pub fn handle(&mut self, message: &MqttMessage) -> Option<f64> {
        match parse_depth_record(&message.content) {
            Ok(depth) => {
                let stored = self.writer.publish(depth);
                self.accepted += 1;
                debug!("Depth: {:.6}", stored);
                Some(stored)
            }
            Err(e) => {
                self.rejected += 1;
                warn!("Ignoring sensor record on {}: {}", message.topic, e);
                None
            }
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Depth feed listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = self.messages.recv() => match message {
                    Some(message) => {
                        self.handle(&message);
                    }
                    None => {
                        warn!("Sensor message channel closed");
                        break;
                    }
                },
            }
        }
        info!(
            "Depth feed stopped ({} readings, {} rejected)",
            self.accepted, self.rejected
        );
    }
}
