//! Control layer for a thruster-driven ROV.
//!
//! Two independent periodic loops: gamepad input to thruster and light
//! commands ([`mapping`]), and depth hold against a pressure sensor
//! ([`depth`]). Both publish over MQTT ([`mqtt`]) and are driven by the
//! tasks in [`runtime`].

pub mod cli;
pub mod config;
pub mod controller;
pub mod depth;
pub mod mapping;
pub mod mqtt;
pub mod runtime;
