//! # MQTT Transport
//!
//! Publish/subscribe plumbing between the control loops and the vehicle.
//!
//! ```text
//! mqtt/
//! ├── config.rs        - broker settings and channel names
//! ├── message.rs       - inbound messages and payload formatting
//! ├── mqtt_handler.rs  - event loop, connection state, subscription routing
//! └── publisher.rs     - CommandPublisher seam and the rumqttc implementation
//! ```
//!
//! Loops only see [`CommandPublisher`]; the event loop runs as its own task
//! and hands sensor messages to subscribers over bounded channels.

pub mod config;
pub mod message;
pub mod mqtt_handler;
pub mod publisher;

pub use config::{MqttConfig, TopicConfig};
pub use message::{format_correction, format_group, MqttMessage};
pub use mqtt_handler::{ConnectionState, MqttHandler, MqttStatus};
pub use publisher::{CommandPublisher, MqttPublisher, TransportError};
