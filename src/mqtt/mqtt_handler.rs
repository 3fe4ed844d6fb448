use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::MqttConfig;
use super::message::MqttMessage;
use super::publisher::{MqttPublisher, TransportError};

// Wait before polling again after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

// Number of recent connection errors kept in the status
const MAX_ERROR_MESSAGES: usize = 10;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MqttStatus {
    pub connection_state: ConnectionState,
    pub error_messages: Vec<String>,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
}

struct Subscription {
    topic: String,
    sender: mpsc::Sender<MqttMessage>,
}

/// Drives the rumqttc event loop: connection state, (re)subscription and
/// routing of inbound publishes.
pub struct MqttHandler {
    client: AsyncClient,
    event_loop: EventLoop,
    subscriptions: Vec<Subscription>,
    status: MqttStatus,
    status_sender: watch::Sender<MqttStatus>,
}

impl MqttHandler {
    /// Creates the client and its handler. Nothing touches the network until
    /// [`MqttHandler::run`] polls the event loop.
    pub fn new(config: &MqttConfig) -> (Self, MqttPublisher) {
        let mut mqtt_options =
            MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let (Some(user), Some(pw)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(user.clone(), pw.clone());
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, config.channel_capacity);
        let status = MqttStatus::default();
        let (status_sender, _) = watch::channel(status.clone());

        let handler = MqttHandler {
            client: client.clone(),
            event_loop,
            subscriptions: Vec::new(),
            status,
            status_sender,
        };
        (handler, MqttPublisher::new(client))
    }

    /// Routes publishes on `topic` to `sender`; the subscription is renewed on
    /// every (re)connect
    pub fn subscribe(&mut self, topic: impl Into<String>, sender: mpsc::Sender<MqttMessage>) {
        self.subscriptions.push(Subscription {
            topic: topic.into(),
            sender,
        });
    }

    pub fn status(&self) -> watch::Receiver<MqttStatus> {
        self.status_sender.subscribe()
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        self.set_state(ConnectionState::Connecting);
        info!("MQTT event loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    if let Err(e) = self.client.try_disconnect() {
                        debug!("MQTT disconnect request failed: {}", e);
                    }
                    break;
                }
                polled = self.event_loop.poll() => match polled {
                    Ok(event) => self.handle_event(event),
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        self.record_error(e.to_string());
                        self.set_state(ConnectionState::Reconnecting);
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                },
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!(
            "MQTT event loop stopped ({} sent, {} received)",
            self.status.messages_sent, self.status.messages_received
        );
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                info!("Connected to MQTT broker");
                self.set_state(ConnectionState::Connected);
                for subscription in &self.subscriptions {
                    if let Err(source) = self.client.try_subscribe(&subscription.topic, QoS::AtMostOnce)
                    {
                        let e = TransportError::Subscribe {
                            topic: subscription.topic.clone(),
                            source,
                        };
                        error!("{}", e);
                    }
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.status.messages_received += 1;
                self.status.last_activity = Some(chrono::Local::now());

                let content = String::from_utf8_lossy(&publish.payload).into_owned();
                let message = MqttMessage::from_topic(publish.topic, content);
                self.route(message);
            }
            Event::Outgoing(Outgoing::Publish(_)) => {
                self.status.messages_sent += 1;
                self.status.last_activity = Some(chrono::Local::now());
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("Broker closed the session");
                self.set_state(ConnectionState::Reconnecting);
            }
            other => debug!("MQTT event: {:?}", other),
        }
    }

    fn route(&self, message: MqttMessage) {
        let mut routed = false;
        for subscription in self.subscriptions.iter().filter(|s| s.topic == message.topic) {
            routed = true;
            if let Err(e) = subscription.sender.try_send(message.clone()) {
                warn!("Dropping message on {}: {}", message.topic, e);
            }
        }
        if !routed {
            debug!("No subscriber for {}", message);
        }
    }

    fn record_error(&mut self, message: String) {
        self.status.error_messages.push(message);
        if self.status.error_messages.len() > MAX_ERROR_MESSAGES {
            self.status.error_messages.remove(0);
        }
        self.status_sender.send_replace(self.status.clone());
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.status.connection_state != state {
            debug!(
                "MQTT state {:?} -> {:?}",
                self.status.connection_state, state
            );
            self.status.connection_state = state;
        }
        self.status_sender.send_replace(self.status.clone());
    }
}
