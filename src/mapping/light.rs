//! Auxiliary light state driven by button edge events.

use serde::{Deserialize, Serialize};

/// Dimmest PWM level of the light
pub const LIGHT_PWM_MIN: u16 = 1100;

/// Brightest PWM level of the light
pub const LIGHT_PWM_MAX: u16 = 1500;

/// Change applied by a single increase or decrease press
pub const LIGHT_PWM_STEP: u16 = 100;

/// Light actions a button press can trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightButton {
    Decrease,
    Increase,
    Toggle,
}

/// Persistent light state owned by the input mapping loop.
///
/// `level` never leaves [`LIGHT_PWM_MIN`, `LIGHT_PWM_MAX`] and is only changed
/// through [`LightState::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightState {
    level: u16,
    on: bool,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            level: LIGHT_PWM_MIN,
            on: false,
        }
    }
}

impl LightState {
    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Applies one button press to the light.
    ///
    /// Dimming and brightening only take effect while the light is on.
    /// Toggling on starts at the dim end; toggling off latches the bright end.
    pub fn apply(&mut self, button: LightButton) {
        match button {
            LightButton::Decrease if self.on => {
                self.level = self
                    .level
                    .saturating_sub(LIGHT_PWM_STEP)
                    .max(LIGHT_PWM_MIN);
            }
            LightButton::Increase if self.on => {
                self.level = self
                    .level
                    .saturating_add(LIGHT_PWM_STEP)
                    .min(LIGHT_PWM_MAX);
            }
            LightButton::Decrease | LightButton::Increase => {}
            LightButton::Toggle => {
                // TODO: confirm with the vehicle owner whether switching off
                // should really latch the bright level for the next switch-on.
                self.level = if self.on { LIGHT_PWM_MAX } else { LIGHT_PWM_MIN };
                self.on = !self.on;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_BUTTONS: [LightButton; 3] = [
        LightButton::Decrease,
        LightButton::Increase,
        LightButton::Toggle,
    ];

    #[test]
    fn starts_dim_and_off() {
        let light = LightState::default();
        assert_eq!(light.level(), LIGHT_PWM_MIN);
        assert!(!light.is_on());
    }

    #[test]
    fn steps_are_ignored_while_off() {
        let mut light = LightState::default();
        light.apply(LightButton::Increase);
        light.apply(LightButton::Increase);
        assert_eq!(light, LightState::default());
        light.apply(LightButton::Decrease);
        assert_eq!(light, LightState::default());
    }

    #[test]
    fn toggle_twice_latches_bright_level() {
        let mut light = LightState::default();
        light.apply(LightButton::Toggle);
        assert!(light.is_on());
        assert_eq!(light.level(), LIGHT_PWM_MIN);

        light.apply(LightButton::Toggle);
        assert!(!light.is_on());
        assert_eq!(light.level(), 1500);
    }

    #[test]
    fn steps_saturate_at_limits() {
        let mut light = LightState::default();
        light.apply(LightButton::Toggle);
        for _ in 0..10 {
            light.apply(LightButton::Increase);
        }
        assert_eq!(light.level(), LIGHT_PWM_MAX);

        light.apply(LightButton::Decrease);
        assert_eq!(light.level(), 1400);

        for _ in 0..10 {
            light.apply(LightButton::Decrease);
        }
        assert_eq!(light.level(), LIGHT_PWM_MIN);
    }

    #[test]
    fn every_short_sequence_keeps_level_in_bounds() {
        // 3^7 sequences of seven presses
        for mut code in 0..3usize.pow(7) {
            let mut light = LightState::default();
            for _ in 0..7 {
                let before = light;
                let button = ALL_BUTTONS[code % 3];
                code /= 3;
                light.apply(button);

                assert!((LIGHT_PWM_MIN..=LIGHT_PWM_MAX).contains(&light.level()));
                if !before.is_on() && button != LightButton::Toggle {
                    assert_eq!(light, before);
                }
            }
        }
    }
}
