use rumqttc::{AsyncClient, ClientError, QoS};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to publish to {topic}: {source}")]
    Publish {
        topic: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: ClientError,
    },
}

/// Sink for the command streams the control loops emit.
///
/// Publishing must not block: loops call it from inside their tick.
pub trait CommandPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: String) -> Result<(), TransportError>;
}

/// Publishes over the shared rumqttc client, fire-and-forget
#[derive(Clone, Debug)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl CommandPublisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: String) -> Result<(), TransportError> {
        debug!("Publishing to {}: {}", topic, payload);
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.into_bytes())
            .map_err(|source| TransportError::Publish {
                topic: topic.to_string(),
                source,
            })
    }
}
