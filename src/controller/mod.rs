//! Controller subsystem for gamepad input handling
//!
//! Implements a two-stage pipeline:
//!
//! 1. [`event_collector`] - gilrs polling on a dedicated thread
//! 2. [`event_processor`] - per-tick snapshots of axes and button presses
//! 3. [`controller_handle`] - startup and shutdown of the pair
//!
//! ```text
//! Gamepad ──► Collector ──[RawControllerEvent]──► InputSampler ──► InputSnapshot
//!            (thread)        (mpsc, 1000)           (per tick)
//! ```

pub mod controller_handle;
pub mod event_collector;
pub mod event_processor;

pub use controller_handle::{ControllerError, ControllerHandle, ControllerSettings};
pub use event_collector::{ButtonType, CollectorError, RawControllerEvent, StickAxis};
pub use event_processor::{AxisBinding, InputBindings, InputSampler, InputSnapshot, SamplerError};
