//! Controller Handle - Unified API for gamepad input
//!
//! Wires the collector thread to a per-tick sampler and owns the collector's
//! lifecycle.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use super::event_collector::{
    ButtonType, CollectorError, CollectorHandle, CollectorSettings, RawControllerEvent, StickAxis,
};
pub use super::event_processor::{
    AxisBinding, InputBindings, InputSampler, InputSnapshot, SamplerError,
};

// Raw events buffered between the collector thread and the sampler
const EVENT_QUEUE_CAPACITY: usize = 1000;

/// Configuration for the complete gamepad input path
#[derive(Clone, Debug, Default)]
pub struct ControllerSettings {
    /// Analog stick deadzone as a fraction (0.0-1.0)
    pub joystick_deadzone: f32,

    /// Index into the list of connected gamepads
    pub gamepad_index: usize,

    /// Gamepad controls to vehicle functions
    pub bindings: InputBindings,
}

/// Errors that can occur while bringing up gamepad input
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Collector error: {0}")]
    CollectorError(#[from] CollectorError),
}

/// Handle for the running collector thread.
///
/// Dropping the handle does not stop the collector; cancel the shutdown token
/// and call [`ControllerHandle::shutdown`] to release the device.
pub struct ControllerHandle {
    collector: CollectorHandle,
    shutdown: CancellationToken,
}

impl ControllerHandle {
    /// Starts collecting from the configured gamepad.
    ///
    /// Fails with [`CollectorError::NoGamepadError`] when no usable gamepad is
    /// connected. The returned sampler yields one [`InputSnapshot`] per call.
    pub async fn spawn(
        settings: ControllerSettings,
        shutdown: CancellationToken,
    ) -> Result<(Self, InputSampler), ControllerError> {
        info!("Initializing Controller system with settings: {:?}", settings);

        let collector_settings = CollectorSettings {
            joystick_deadzone: settings.joystick_deadzone,
            gamepad_index: settings.gamepad_index,
        };

        let (event_sender, event_receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        debug!(
            "Created event channel with buffer capacity {}",
            EVENT_QUEUE_CAPACITY
        );

        let collector =
            CollectorHandle::spawn(collector_settings, event_sender, shutdown.clone()).await?;
        let sampler = InputSampler::new(event_receiver, settings.bindings);

        info!("Controller system initialized on {}", collector.gamepad_name());
        Ok((
            Self {
                collector,
                shutdown,
            },
            sampler,
        ))
    }

    pub fn gamepad_name(&self) -> &str {
        self.collector.gamepad_name()
    }

    /// Stops the collector thread and waits for it to release the gamepad
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.collector.join().await;
        info!("Controller system shut down");
    }
}
