//! Session lifecycle: state, checkpoints, chronometer, termination,
//! and the controller that coordinates them.

pub mod checkpoint;
pub mod chronometer;
pub mod controller;
pub mod termination;

pub use checkpoint::{DurationCheckpoint, SessionState};
pub use chronometer::Chronometer;
pub use controller::{Session, SessionController};
pub use termination::AutoTerminationPolicy;
