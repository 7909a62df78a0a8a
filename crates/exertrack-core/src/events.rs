//! Inbound and outbound events for the session controller.
//!
//! Every external stimulus -- service stream deliveries, user button
//! presses, chronometer ticks, ambient display transitions -- enters the
//! controller as a [`SessionEvent`] on a single channel with a single
//! consumer, so state mutation never races. Everything the UI needs to
//! render leaves as a [`DisplayEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::MetricSnapshot;
use crate::session::checkpoint::{DurationCheckpoint, SessionState};

/// Reduced-power display transitions, delivered by the host windowing
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientEvent {
    /// Display entered reduced-power mode.
    Enter,
    /// Display returned to interactive mode.
    Exit,
    /// Periodic redraw while remaining in reduced-power mode.
    Update,
}

/// Inbound message to the session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Authoritative state delivery from the exercise service.
    StateChanged { state: SessionState },
    /// New duration checkpoint from the exercise service. Replaces the
    /// current checkpoint wholesale.
    CheckpointUpdated { checkpoint: DurationCheckpoint },
    /// Sparse metric delivery from the exercise service.
    MetricsUpdated { metrics: MetricSnapshot },
    /// Chronometer cadence tick.
    ChronoTick,
    /// Ambient display transition.
    Ambient { event: AmbientEvent },
    /// User pressed the start/end button.
    StartEndPressed,
    /// User pressed the pause/resume button.
    PauseResumePressed,
}

/// Label for the start/end button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartEndLabel {
    Start,
    End,
}

/// Label for the pause/resume button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseResumeLabel {
    Pause,
    Resume,
}

/// Button affordance state derived from the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub start_end: StartEndLabel,
    pub pause_resume: PauseResumeLabel,
    /// Pausing only makes sense while a session exists.
    pub pause_resume_enabled: bool,
}

impl ButtonState {
    pub fn for_state(state: SessionState) -> Self {
        Self {
            start_end: if state.is_ended() {
                StartEndLabel::Start
            } else {
                StartEndLabel::End
            },
            pause_resume: if state.is_paused() {
                PauseResumeLabel::Resume
            } else {
                PauseResumeLabel::Pause
            },
            pause_resume_enabled: !state.is_ended(),
        }
    }
}

/// Outbound message published by the session controller for the UI layer.
///
/// These are outputs only; the UI feeds nothing back except the user
/// request variants of [`SessionEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// Formatted elapsed active duration.
    ElapsedUpdated {
        formatted: String,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// Formatted metric values; fields without data carry the empty
    /// placeholder.
    MetricsUpdated {
        heart_rate: String,
        distance_km: String,
        steps: String,
        at: DateTime<Utc>,
    },
    /// Which metric fields the bound service can populate at all.
    MetricAvailability {
        heart_rate: bool,
        distance: bool,
        steps: bool,
        at: DateTime<Utc>,
    },
    /// Displayed fields were reset for a new session.
    DisplayReset { session_id: Uuid, at: DateTime<Utc> },
    /// Button labels/enablement changed.
    ButtonsUpdated {
        buttons: ButtonState,
        at: DateTime<Utc>,
    },
    /// Ambient (reduced-power) theme toggled.
    AmbientChanged { ambient: bool, at: DateTime<Utc> },
    /// Another app is already tracking an exercise; the UI should route
    /// to a confirmation flow instead of starting directly.
    ConfirmationRequired { at: DateTime<Utc> },
    /// The auto-termination policy fired.
    AutoEnded {
        session_id: Uuid,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_for_ended() {
        let b = ButtonState::for_state(SessionState::Ended);
        assert_eq!(b.start_end, StartEndLabel::Start);
        assert_eq!(b.pause_resume, PauseResumeLabel::Pause);
        assert!(!b.pause_resume_enabled);
    }

    #[test]
    fn buttons_for_active_and_paused() {
        let b = ButtonState::for_state(SessionState::Active);
        assert_eq!(b.start_end, StartEndLabel::End);
        assert_eq!(b.pause_resume, PauseResumeLabel::Pause);
        assert!(b.pause_resume_enabled);

        let b = ButtonState::for_state(SessionState::Paused);
        assert_eq!(b.pause_resume, PauseResumeLabel::Resume);
        assert!(b.pause_resume_enabled);
    }

    #[test]
    fn session_event_serializes_tagged() {
        let ev = SessionEvent::StateChanged {
            state: SessionState::Active,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"state_changed\""));
        assert!(json.contains("\"active\""));
    }
}
