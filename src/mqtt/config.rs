use serde::{Deserialize, Serialize};

/// Broker connection settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
    /// Request queue size of the rumqttc client
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "rovcontrol".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 5,
            channel_capacity: 100,
        }
    }
}

/// Channel names for every published and subscribed stream
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TopicConfig {
    pub horizontal: String,
    pub vertical: String,
    pub light: String,
    pub depth_correction: String,
    pub depth_sensor: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            horizontal: "th_h".to_string(),
            vertical: "th_v".to_string(),
            light: "light".to_string(),
            depth_correction: "joy_topic".to_string(),
            depth_sensor: "/bar30/all".to_string(),
        }
    }
}

impl TopicConfig {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("horizontal", self.horizontal.as_str()),
            ("vertical", self.vertical.as_str()),
            ("light", self.light.as_str()),
            ("depth_correction", self.depth_correction.as_str()),
            ("depth_sensor", self.depth_sensor.as_str()),
        ]
        .into_iter()
    }
}
