use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// Pause between polls of the gilrs event queue
const POLL_INTERVAL: Duration = Duration::from_millis(1);

// Raw controller event with chrono timestamps
#[derive(Debug, Clone)]
pub enum RawControllerEvent {
    AxisMoved {
        axis: StickAxis,
        value: f32,
        timestamp: DateTime<Local>,
    },
    ButtonPressed {
        button: ButtonType,
        timestamp: DateTime<Local>,
    },
}

// Analog axes the collector forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickAxis {
    LeftStickX,
    LeftStickY,
    LeftZ,
    RightStickX,
    RightStickY,
    RightZ,
}

impl StickAxis {
    pub const ALL: [StickAxis; 6] = [
        StickAxis::LeftStickX,
        StickAxis::LeftStickY,
        StickAxis::LeftZ,
        StickAxis::RightStickX,
        StickAxis::RightStickY,
        StickAxis::RightZ,
    ];
}

// Button type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    A,
    B,
    X,
    Y,
    Start,
    Select,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Guide,
}

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
    pub gamepad_index: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
            gamepad_index: 0,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),

    #[error("No gamepad connected: {0}")]
    NoGamepadError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    gilrs: Gilrs,
    active_gamepad: Option<GamepadId>,
    gamepad_name: String,
    settings: CollectorSettings,
    event_sender: mpsc::Sender<RawControllerEvent>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    pub fn gamepad_name(&self) -> &str {
        &self.gamepad_name
    }
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: CollectorSettings,
        event_sender: mpsc::Sender<RawControllerEvent>,
    ) -> Result<Self, CollectorError> {
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, String::new(), settings, event_sender))
    }

    // Select the configured gamepad and transition to Collecting state
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            return Err(CollectorError::NoGamepadError(
                "gilrs reported no connected gamepads".to_string(),
            ));
        }

        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
            info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
        }

        let index = self.settings.gamepad_index;
        let Some((id, gamepad)) = gamepads.get(index) else {
            return Err(CollectorError::NoGamepadError(format!(
                "gamepad index {} requested but only {} connected",
                index,
                gamepads.len()
            )));
        };
        let id = *id;
        let name = gamepad.name().to_string();
        drop(gamepads);

        info!("Selected gamepad: {} ({})", name, id);
        self.active_gamepad = Some(id);
        self.gamepad_name = name;

        Ok(self.transition())
    }
}

impl EventCollector<Collecting> {
    // Drain all pending gilrs events and forward the ones we care about
    pub fn collect_pending_events(&mut self) -> Result<usize, CollectorError> {
        let mut forwarded = 0;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if self.active_gamepad.is_some_and(|active| active != id) {
                continue;
            }

            for raw_event in self.convert_gilrs_event(event) {
                match self.event_sender.try_send(raw_event) {
                    Ok(_) => forwarded += 1,
                    Err(mpsc::error::TrySendError::Full(dropped)) => {
                        warn!("Input queue full, dropping event: {:?}", dropped);
                    }
                    Err(e) => return Err(CollectorError::EventSendError(e.to_string())),
                }
            }
        }

        Ok(forwarded)
    }

    // Poll until shutdown or until the sampler goes away
    pub fn run_collection_loop(mut self, shutdown: &CancellationToken) {
        info!("Starting Event Collector loop for {}", self.gamepad_name);

        let mut event_count = 0usize;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(30);

        while !shutdown.is_cancelled() {
            match self.collect_pending_events() {
                Ok(n) => event_count += n,
                Err(e) => {
                    error!("Event Collector stopping: {}", e);
                    break;
                }
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: forwarded {} events in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }

            std::thread::sleep(POLL_INTERVAL);
        }

        info!("Event Collector released {}", self.gamepad_name);
    }

    fn convert_gilrs_event(&self, event: EventType) -> Vec<RawControllerEvent> {
        let now = Local::now();

        match event {
            EventType::AxisChanged(axis, value, _) => match map_axis(axis) {
                Some(axis) => vec![RawControllerEvent::AxisMoved {
                    axis,
                    value: apply_deadzone(value, self.settings.joystick_deadzone),
                    timestamp: now,
                }],
                None => {
                    debug!("Ignoring unsupported axis: {:?}", axis);
                    Vec::new()
                }
            },
            EventType::ButtonPressed(button, _) => match map_button(button) {
                Some(button) => {
                    debug!("Button pressed: {:?} at {}", button, now.format("%H:%M:%S.%3f"));
                    vec![RawControllerEvent::ButtonPressed {
                        button,
                        timestamp: now,
                    }]
                }
                None => Vec::new(),
            },
            EventType::Disconnected => {
                // Center every axis so the vehicle does not keep the last command
                warn!("Gamepad {} disconnected, centering axes", self.gamepad_name);
                StickAxis::ALL
                    .iter()
                    .map(|axis| RawControllerEvent::AxisMoved {
                        axis: *axis,
                        value: 0.0,
                        timestamp: now,
                    })
                    .collect()
            }
            EventType::Connected => {
                info!("Gamepad {} reconnected", self.gamepad_name);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

// Public interface for spawning the collector on its own thread
pub struct CollectorHandle {
    worker: Option<std::thread::JoinHandle<()>>,
    gamepad_name: String,
}

impl CollectorHandle {
    // Start the collector thread and wait until a gamepad is selected
    pub async fn spawn(
        settings: CollectorSettings,
        event_sender: mpsc::Sender<RawControllerEvent>,
        shutdown: CancellationToken,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        // gilrs stays on the thread that created it
        let worker = std::thread::Builder::new()
            .name("input-collector".to_string())
            .spawn(move || {
                let collector = EventCollector::<Initializing>::create(settings, event_sender)
                    .and_then(|collector| collector.initialize());
                match collector {
                    Ok(collector) => {
                        let _ = ready_tx.send(Ok(collector.gamepad_name().to_string()));
                        collector.run_collection_loop(&shutdown);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| CollectorError::InitializationError(e.to_string()))?;

        let gamepad_name = ready_rx.await.map_err(|_| {
            CollectorError::InitializationError("collector thread exited during startup".into())
        })??;

        info!("Event Collector running on {}", gamepad_name);
        Ok(Self {
            worker: Some(worker),
            gamepad_name,
        })
    }

    pub fn gamepad_name(&self) -> &str {
        &self.gamepad_name
    }

    // Wait for the collector thread to let go of the device
    pub async fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            match tokio::task::spawn_blocking(move || worker.join()).await {
                Ok(Ok(())) => debug!("Event Collector thread joined"),
                _ => warn!("Event Collector thread did not exit cleanly"),
            }
        }
    }
}

fn map_axis(axis: Axis) -> Option<StickAxis> {
    match axis {
        Axis::LeftStickX => Some(StickAxis::LeftStickX),
        Axis::LeftStickY => Some(StickAxis::LeftStickY),
        Axis::LeftZ => Some(StickAxis::LeftZ),
        Axis::RightStickX => Some(StickAxis::RightStickX),
        Axis::RightStickY => Some(StickAxis::RightStickY),
        Axis::RightZ => Some(StickAxis::RightZ),
        _ => None,
    }
}

// Helper function to map gilrs Button to our ButtonType
fn map_button(button: Button) -> Option<ButtonType> {
    match button {
        Button::South => Some(ButtonType::A),
        Button::East => Some(ButtonType::B),
        Button::West => Some(ButtonType::Y),
        Button::North => Some(ButtonType::X),
        Button::Start => Some(ButtonType::Start),
        Button::Select => Some(ButtonType::Select),
        Button::LeftTrigger => Some(ButtonType::LeftBumper),
        Button::RightTrigger => Some(ButtonType::RightBumper),
        Button::LeftTrigger2 => Some(ButtonType::LeftTrigger),
        Button::RightTrigger2 => Some(ButtonType::RightTrigger),
        Button::LeftThumb => Some(ButtonType::LeftStick),
        Button::RightThumb => Some(ButtonType::RightStick),
        Button::DPadUp => Some(ButtonType::DPadUp),
        Button::DPadDown => Some(ButtonType::DPadDown),
        Button::DPadLeft => Some(ButtonType::DPadLeft),
        Button::DPadRight => Some(ButtonType::DPadRight),
        Button::Mode => Some(ButtonType::Guide),
        _ => None,
    }
}

// Helper function to apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_swallows_small_deflection() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(-0.049, 0.05), 0.0);
    }

    #[test]
    fn deadzone_rescales_to_full_range() {
        assert!((apply_deadzone(1.0, 0.05) - 1.0).abs() < 1e-6);
        assert!((apply_deadzone(-1.0, 0.05) + 1.0).abs() < 1e-6);
        assert!((apply_deadzone(0.525, 0.05) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_deadzone_is_identity() {
        assert_eq!(apply_deadzone(0.3, 0.0), 0.3);
        assert_eq!(apply_deadzone(-0.7, 0.0), -0.7);
    }

    #[test]
    fn bumpers_and_back_button_are_mapped() {
        assert_eq!(map_button(Button::LeftTrigger), Some(ButtonType::LeftBumper));
        assert_eq!(map_button(Button::RightTrigger), Some(ButtonType::RightBumper));
        assert_eq!(map_button(Button::Select), Some(ButtonType::Select));
        assert_eq!(map_button(Button::Unknown), None);
    }

    #[test]
    fn stick_axes_are_mapped() {
        assert_eq!(map_axis(Axis::LeftStickY), Some(StickAxis::LeftStickY));
        assert_eq!(map_axis(Axis::RightStickX), Some(StickAxis::RightStickX));
        assert_eq!(map_axis(Axis::DPadX), None);
    }
}
