use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::controller::event_collector::{ButtonType, RawControllerEvent, StickAxis};
use crate::mapping::{JoystickState, LightButton};

/// One gamepad axis bound to a vehicle axis role
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisBinding {
    pub axis: StickAxis,
    /// Flip the sign so the role reads in the vehicle's convention
    #[serde(default)]
    pub inverted: bool,
}

impl AxisBinding {
    pub fn new(axis: StickAxis, inverted: bool) -> Self {
        Self { axis, inverted }
    }

    fn apply(&self, raw: f32) -> f64 {
        let value = f64::from(raw);
        if self.inverted {
            -value
        } else {
            value
        }
    }
}

/// Which gamepad controls drive which vehicle function.
///
/// gilrs reports stick Y axes as positive when pushed away from the operator;
/// forward and depth are inverted by default so they read in the SDL
/// convention the thruster mixing was tuned with (pushed away is negative).
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct InputBindings {
    pub forward: AxisBinding,
    pub lateral: AxisBinding,
    pub depth: AxisBinding,
    pub rotation: AxisBinding,
    pub light_decrease: ButtonType,
    pub light_increase: ButtonType,
    pub light_toggle: ButtonType,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            forward: AxisBinding::new(StickAxis::LeftStickY, true),
            lateral: AxisBinding::new(StickAxis::LeftStickX, false),
            depth: AxisBinding::new(StickAxis::RightStickY, true),
            rotation: AxisBinding::new(StickAxis::RightStickX, false),
            light_decrease: ButtonType::LeftBumper,
            light_increase: ButtonType::RightBumper,
            light_toggle: ButtonType::Select,
        }
    }
}

impl InputBindings {
    /// Light action bound to a button, if any
    pub fn light_button(&self, button: ButtonType) -> Option<LightButton> {
        if button == self.light_decrease {
            Some(LightButton::Decrease)
        } else if button == self.light_increase {
            Some(LightButton::Increase)
        } else if button == self.light_toggle {
            Some(LightButton::Toggle)
        } else {
            None
        }
    }
}

/// Everything the operator did since the previous tick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub joystick: JoystickState,
    /// Light button presses in arrival order
    pub button_events: Vec<LightButton>,
}

// Sampler errors
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Input event channel disconnected")]
    Disconnected,
}

/// Turns the collector's event stream into one snapshot per tick.
///
/// Axis values persist across ticks until the collector reports a change;
/// button presses are handed out exactly once.
pub struct InputSampler {
    event_receiver: mpsc::Receiver<RawControllerEvent>,
    bindings: InputBindings,
    axis_values: HashMap<StickAxis, f32>,
}

impl InputSampler {
    pub fn new(event_receiver: mpsc::Receiver<RawControllerEvent>, bindings: InputBindings) -> Self {
        Self {
            event_receiver,
            bindings,
            axis_values: HashMap::new(),
        }
    }

    // Drain everything queued since the last call
    pub fn sample(&mut self) -> Result<InputSnapshot, SamplerError> {
        let mut button_events = Vec::new();
        let mut drained = 0usize;

        loop {
            match self.event_receiver.try_recv() {
                Ok(RawControllerEvent::AxisMoved { axis, value, .. }) => {
                    self.axis_values.insert(axis, value);
                    drained += 1;
                }
                Ok(RawControllerEvent::ButtonPressed { button, timestamp }) => {
                    drained += 1;
                    if let Some(light_button) = self.bindings.light_button(button) {
                        debug!(
                            "{:?} -> {:?} at {}",
                            button,
                            light_button,
                            timestamp.format("%H:%M:%S.%3f")
                        );
                        button_events.push(light_button);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    error!("Event channel disconnected!");
                    return Err(SamplerError::Disconnected);
                }
            }
        }

        if drained > 0 {
            debug!("Sampled {} raw input events", drained);
        }

        Ok(InputSnapshot {
            joystick: JoystickState {
                forward: self.axis(&self.bindings.forward),
                lateral: self.axis(&self.bindings.lateral),
                depth: self.axis(&self.bindings.depth),
                rotation: self.axis(&self.bindings.rotation),
            },
            button_events,
        })
    }

    fn axis(&self, binding: &AxisBinding) -> f64 {
        binding.apply(self.axis_values.get(&binding.axis).copied().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn axis(axis: StickAxis, value: f32) -> RawControllerEvent {
        RawControllerEvent::AxisMoved {
            axis,
            value,
            timestamp: Local::now(),
        }
    }

    fn press(button: ButtonType) -> RawControllerEvent {
        RawControllerEvent::ButtonPressed {
            button,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn empty_queue_yields_neutral_snapshot() {
        let (_tx, rx) = mpsc::channel(16);
        let mut sampler = InputSampler::new(rx, InputBindings::default());
        assert_eq!(sampler.sample().unwrap(), InputSnapshot::default());
    }

    #[test]
    fn latest_axis_value_wins_and_persists() {
        let (tx, rx) = mpsc::channel(16);
        let mut sampler = InputSampler::new(rx, InputBindings::default());

        tx.try_send(axis(StickAxis::LeftStickX, 0.2)).unwrap();
        tx.try_send(axis(StickAxis::LeftStickX, 0.6)).unwrap();
        tx.try_send(axis(StickAxis::RightStickX, -0.5)).unwrap();

        let snapshot = sampler.sample().unwrap();
        assert!((snapshot.joystick.lateral - 0.6).abs() < 1e-6);
        assert!((snapshot.joystick.rotation + 0.5).abs() < 1e-6);

        // nothing new arrives, values hold
        let snapshot = sampler.sample().unwrap();
        assert!((snapshot.joystick.lateral - 0.6).abs() < 1e-6);
    }

    #[test]
    fn inverted_bindings_flip_sign() {
        let (tx, rx) = mpsc::channel(16);
        let mut sampler = InputSampler::new(rx, InputBindings::default());

        tx.try_send(axis(StickAxis::LeftStickY, 1.0)).unwrap();
        tx.try_send(axis(StickAxis::RightStickY, 0.5)).unwrap();

        let snapshot = sampler.sample().unwrap();
        assert_eq!(snapshot.joystick.forward, -1.0);
        assert_eq!(snapshot.joystick.depth, -0.5);
    }

    #[test]
    fn button_presses_are_reported_once_in_order() {
        let (tx, rx) = mpsc::channel(16);
        let mut sampler = InputSampler::new(rx, InputBindings::default());

        tx.try_send(press(ButtonType::Select)).unwrap();
        tx.try_send(press(ButtonType::A)).unwrap();
        tx.try_send(press(ButtonType::RightBumper)).unwrap();
        tx.try_send(press(ButtonType::LeftBumper)).unwrap();

        let snapshot = sampler.sample().unwrap();
        assert_eq!(
            snapshot.button_events,
            vec![
                LightButton::Toggle,
                LightButton::Increase,
                LightButton::Decrease
            ]
        );
        assert!(sampler.sample().unwrap().button_events.is_empty());
    }

    #[test]
    fn disconnected_collector_is_an_error() {
        let (tx, rx) = mpsc::channel(16);
        let mut sampler = InputSampler::new(rx, InputBindings::default());
        drop(tx);
        assert!(matches!(sampler.sample(), Err(SamplerError::Disconnected)));
    }

    #[test]
    fn bindings_resolve_light_buttons() {
        let bindings = InputBindings::default();
        assert_eq!(
            bindings.light_button(ButtonType::LeftBumper),
            Some(LightButton::Decrease)
        );
        assert_eq!(bindings.light_button(ButtonType::B), None);
    }
}
