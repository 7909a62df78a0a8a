//! # Exertrack Core Library
//!
//! Session lifecycle and duration-tracking engine for a wearable exercise
//! app. The external exercise-tracking service owns the sensors and the
//! authoritative session state; this library owns everything between that
//! service and the display:
//!
//! - **Checkpoint recomputation**: elapsed active duration is derived on
//!   demand from the latest [`DurationCheckpoint`], never counted
//!   incrementally, so missed ticks and background suspension cannot
//!   drift the display
//! - **Chronometer**: a single-flight recurring tick task at a fast
//!   foreground cadence, replaced by one-shot refreshes in ambient mode
//! - **Auto-termination**: an edge-triggered policy that ends the session
//!   exactly once when the configured active duration is exceeded, wakes
//!   the device, and plays a sequential alert
//! - **Controller**: a single event-consuming state machine that owns all
//!   mutable session state
//!
//! ## Key Components
//!
//! - [`SessionController`]: event loop and coordinator
//! - [`DurationCheckpoint`]: checkpoint-based duration calculator
//! - [`AutoTerminationPolicy`]: fire-exactly-once threshold policy
//! - [`AlertSequencer`]: sequential alert cue playback
//! - [`ExerciseService`]: interface to the external tracking service

pub mod alert;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod metrics;
pub mod service;
pub mod session;
pub mod sim;
pub mod wake;

pub use alert::{AlertSequencer, CueHandle, CueSource};
pub use config::SessionConfig;
pub use error::{AlertError, ConfigError, CoreError, SessionError, WakeError};
pub use events::{
    AmbientEvent, ButtonState, DisplayEvent, PauseResumeLabel, SessionEvent, StartEndLabel,
};
pub use metrics::{Capabilities, MetricKind, MetricSnapshot};
pub use service::{ExerciseService, ServiceSnapshot};
pub use session::{AutoTerminationPolicy, DurationCheckpoint, Session, SessionController, SessionState};
pub use wake::{WakeGuard, WakeSource};
