//! Joystick snapshot to thruster and light commands.
//!
//! ```text
//! t1 = pwm(-lateral + rotation)      horizontal = [t4, t1, t2]
//! t2 = pwm( lateral + rotation)      vertical   = [t5, t3]
//! t3 = pwm( forward)
//! t4 = t5 = pwm(-depth)
//! ```

use super::light::{LightButton, LightState};
use super::thruster::{pwm, ThrusterCommandSet};

/// Axis readings of one tick, in the input device's own sign convention.
///
/// `depth` is the raw third axis; the vertical thrusters receive its negation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JoystickState {
    pub forward: f64,
    pub lateral: f64,
    pub depth: f64,
    pub rotation: f64,
}

impl JoystickState {
    /// Depth assist as fed to the vertical thrusters
    pub fn depth_assist(&self) -> f64 {
        -self.depth
    }
}

/// Result of a mapping tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappedCommands {
    pub thrusters: ThrusterCommandSet,
    pub light_level: u16,
}

/// Runs one input mapping tick.
///
/// Button events are applied in arrival order, each one seeing the light
/// state left by the previous. Thruster commands depend on the axes only.
pub fn compute_tick(
    joystick: &JoystickState,
    button_events: &[LightButton],
    mut light: LightState,
) -> (MappedCommands, LightState) {
    let depth_assist = joystick.depth_assist();
    let thrusters = ThrusterCommandSet {
        t1: pwm(-joystick.lateral + joystick.rotation),
        t2: pwm(joystick.lateral + joystick.rotation),
        t3: pwm(joystick.forward),
        t4: pwm(depth_assist),
        t5: pwm(depth_assist),
    };

    for button in button_events {
        light.apply(*button);
    }

    (
        MappedCommands {
            thrusters,
            light_level: light.level(),
        },
        light,
    )
}
