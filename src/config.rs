use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{read_to_string, try_exists};
use tracing::{debug, info};

use crate::controller::{ControllerSettings, InputBindings};
use crate::mqtt::{MqttConfig, TopicConfig};

/// Overrides the config file location
pub const CONFIG_ENV_VAR: &str = "ROVCONTROL_CONFIG";

const CONFIG_DIR: &str = "rovcontrol";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RovConfig {
    pub mqtt: MqttConfig,
    pub topics: TopicConfig,
    pub input: InputConfig,
    pub depth: DepthConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub rate_hz: f64,
    pub joystick_deadzone: f32,
    pub gamepad_index: usize,
    pub bindings: InputBindings,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            joystick_deadzone: 0.05,
            gamepad_index: 0,
            bindings: InputBindings::default(),
        }
    }
}

impl InputConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            joystick_deadzone: self.joystick_deadzone,
            gamepad_index: self.gamepad_index,
            bindings: self.bindings.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DepthConfig {
    pub rate_hz: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self { rate_hz: 5.0 }
    }
}

impl RovConfig {
    /// Loads the config from `$ROVCONTROL_CONFIG` or the user config dir.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub async fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path).await,
            None => {
                info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let exists = try_exists(path).await.map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if !exists {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    /// Parses and validates TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, rate) in [("input", self.input.rate_hz), ("depth", self.depth.rate_hz)] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.rate_hz must be positive, got {rate}"
                )));
            }
        }

        let deadzone = self.input.joystick_deadzone;
        if !(0.0..1.0).contains(&deadzone) {
            return Err(ConfigError::Invalid(format!(
                "input.joystick_deadzone must be in [0, 1), got {deadzone}"
            )));
        }

        if let Some((name, _)) = self.topics.iter().find(|(_, topic)| topic.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("topics.{name} is empty")));
        }

        let bindings = &self.input.bindings;
        if bindings.light_decrease == bindings.light_increase
            || bindings.light_decrease == bindings.light_toggle
            || bindings.light_increase == bindings.light_toggle
        {
            return Err(ConfigError::Invalid(
                "light buttons must be bound to distinct buttons".to_string(),
            ));
        }

        if self.mqtt.host.trim().is_empty() {
            return Err(ConfigError::Invalid("mqtt.host is empty".to_string()));
        }
        if self.mqtt.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "mqtt.channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|mut base| {
        base.push(CONFIG_DIR);
        base.push(CONFIG_FILE);
        base
    })
}
