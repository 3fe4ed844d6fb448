//! Depth hold: PID correction toward a fixed setpoint from pressure readings.
//!
//! ```text
//! sensor topic ──► parse_depth_record ──► DepthWriter ─┐
//!                                                      │ latest value
//! tick ──► DepthReader::latest ──► compute_tick ──► normalized correction
//! ```

pub mod depth_controller;
pub mod error_window;
pub mod reading;
pub mod sensor;

pub use depth_controller::{compute_tick, DepthCorrection, DepthMode, PidState};
pub use error_window::{ErrorWindow, HISTORY_CAPACITY};
pub use reading::{depth_register, DepthReader, DepthWriter};
pub use sensor::{parse_depth_record, SensorError};
