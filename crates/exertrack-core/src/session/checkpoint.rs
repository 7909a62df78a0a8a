//! Session state and checkpoint-based duration recomputation.
//!
//! Elapsed active duration is never counted incrementally. The exercise
//! service periodically emits a [`DurationCheckpoint`] pairing a reference
//! instant with the active duration known at that instant; the current
//! duration is recomputed from the latest checkpoint on demand. Missed
//! ticks and background suspension therefore cannot drift the display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of the exercise session.
///
/// Transitions arrive only from the external exercise service's state
/// stream; the engine treats them as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Paused,
    Ended,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }

    pub fn is_paused(self) -> bool {
        self == SessionState::Paused
    }

    pub fn is_ended(self) -> bool {
        self == SessionState::Ended
    }
}

/// Immutable duration checkpoint from the exercise service.
///
/// Replaced wholesale on every delivery, never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationCheckpoint {
    /// Instant at which the service recalibrated.
    pub reference_instant: DateTime<Utc>,
    /// Active duration accumulated as of `reference_instant`, in
    /// milliseconds.
    pub active_duration_at_reference_ms: u64,
}

impl DurationCheckpoint {
    pub fn new(reference_instant: DateTime<Utc>, active_duration: Duration) -> Self {
        Self {
            reference_instant,
            active_duration_at_reference_ms: active_duration.as_millis() as u64,
        }
    }

    /// A zero checkpoint anchored at `reference_instant`.
    pub fn zero(reference_instant: DateTime<Utc>) -> Self {
        Self::new(reference_instant, Duration::ZERO)
    }

    pub fn active_duration(&self) -> Duration {
        Duration::from_millis(self.active_duration_at_reference_ms)
    }

    /// Elapsed active duration to display at `now`.
    ///
    /// While active, the wall-clock delta since the reference instant is
    /// added on top of the checkpointed duration. A reference instant in
    /// the future means a stale checkpoint is being reused; the delta is
    /// clamped to zero rather than reported as an error. While paused or
    /// ended the duration is frozen at the checkpointed value, independent
    /// of `now`.
    pub fn display_duration(&self, now: DateTime<Utc>, state: SessionState) -> Duration {
        match state {
            SessionState::Active => {
                let delta = (now - self.reference_instant)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                self.active_duration() + delta
            }
            SessionState::Paused | SessionState::Ended => self.active_duration(),
        }
    }
}
