//! Interface to the external exercise-tracking service.
//!
//! The service is a collaborator, not part of this engine: it owns the
//! sensors, the authoritative session state, and the checkpoint
//! recalibration. The engine only issues requests and consumes the
//! service's deliveries, which the host pushes into the controller's
//! event channel as [`crate::events::SessionEvent`]s in the order the
//! service observed them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::metrics::{Capabilities, MetricSnapshot};
use crate::session::checkpoint::{DurationCheckpoint, SessionState};

/// Point-in-time view of the service, used for the one-shot refreshes in
/// ambient mode where no live subscription is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub state: SessionState,
    pub checkpoint: DurationCheckpoint,
    /// Latest metrics, if any have been delivered this session.
    pub metrics: Option<MetricSnapshot>,
}

/// External exercise-tracking service.
///
/// All lifecycle requests are asynchronous and are not assumed to
/// complete synchronously: the authoritative state change still arrives
/// later on the state stream. A request returning `Ok` means the service
/// accepted it, nothing more.
#[async_trait]
pub trait ExerciseService: Send + Sync {
    async fn start_session(&self) -> Result<(), SessionError>;
    async fn pause_session(&self) -> Result<(), SessionError>;
    async fn resume_session(&self) -> Result<(), SessionError>;
    async fn end_session(&self) -> Result<(), SessionError>;

    /// Whether another app is already tracking an exercise.
    async fn is_session_in_progress_elsewhere(&self) -> bool;

    /// Whether this service already has a session in progress.
    async fn is_session_in_progress(&self) -> bool;

    /// Metric kinds this service can deliver.
    fn current_capabilities(&self) -> Capabilities;

    /// Current state/checkpoint/metrics without a subscription.
    fn snapshot(&self) -> ServiceSnapshot;
}
