//! Input mapping: joystick snapshots and button presses to actuator commands.
//!
//! Pure, synchronous computation. The periodic loop that drives it lives in
//! [`crate::runtime::thruster_loop`].

pub mod input_mapper;
pub mod light;
pub mod thruster;

pub use input_mapper::{compute_tick, JoystickState, MappedCommands};
pub use light::{LightButton, LightState};
pub use thruster::{pwm, ThrusterCommandSet};
