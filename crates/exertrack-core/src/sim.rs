//! Deterministic simulation doubles for the external collaborators.
//!
//! Provides an in-process exercise service, alert cue source, and wake
//! source with inspectable state. The CLI drives a whole session against
//! these, and the test suites use them to verify controller behavior
//! without hardware. Playback timing uses `tokio::time`, so tests running
//! with paused time stay fully deterministic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::alert::{CueHandle, CueSource};
use crate::error::{AlertError, SessionError, WakeError};
use crate::events::SessionEvent;
use crate::metrics::{Capabilities, MetricKind, MetricSnapshot};
use crate::service::{ExerciseService, ServiceSnapshot};
use crate::session::checkpoint::{DurationCheckpoint, SessionState};
use crate::wake::{WakeGuard, WakeSource};

// ── Exercise service ─────────────────────────────────────────────────

#[derive(Debug)]
struct SimServiceState {
    state: SessionState,
    checkpoint: DurationCheckpoint,
    metrics: Option<MetricSnapshot>,
}

/// In-process exercise service.
///
/// Requests mutate the simulated state and deliver the resulting state
/// and checkpoint updates onto the controller's event channel, in order,
/// the way the real service's streams would. Pause/resume/end recalibrate
/// the checkpoint exactly like a real recalibration: the active duration
/// accumulated so far is frozen into a fresh checkpoint anchored at the
/// request instant.
pub struct SimExerciseService {
    inner: Mutex<SimServiceState>,
    events: UnboundedSender<SessionEvent>,
    tracking_elsewhere: AtomicBool,
    capabilities: Capabilities,
}

impl SimExerciseService {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            inner: Mutex::new(SimServiceState {
                state: SessionState::Ended,
                checkpoint: DurationCheckpoint::zero(Utc::now()),
                metrics: None,
            }),
            events,
            tracking_elsewhere: AtomicBool::new(false),
            capabilities: [MetricKind::HeartRate, MetricKind::Distance, MetricKind::Steps]
                .into_iter()
                .collect(),
        }
    }

    /// Simulate another app holding the exercise.
    pub fn set_tracking_elsewhere(&self, value: bool) {
        self.tracking_elsewhere.store(value, Ordering::SeqCst);
    }

    /// Deliver a metric snapshot on the stream.
    pub fn push_metrics(&self, metrics: MetricSnapshot) {
        self.inner.lock().unwrap().metrics = Some(metrics.clone());
        let _ = self.events.send(SessionEvent::MetricsUpdated { metrics });
    }

    /// Deliver a recalibrated checkpoint on the stream.
    pub fn push_checkpoint(&self, checkpoint: DurationCheckpoint) {
        self.inner.lock().unwrap().checkpoint = checkpoint;
        let _ = self.events.send(SessionEvent::CheckpointUpdated { checkpoint });
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    fn transition(&self, next: SessionState) {
        let checkpoint = {
            let mut inner = self.inner.lock().unwrap();
            let now = Utc::now();
            let starting_fresh = next.is_active() && inner.state.is_ended();
            let checkpoint = if starting_fresh {
                // Fresh session starts from zero.
                DurationCheckpoint::zero(now)
            } else {
                let frozen = inner.checkpoint.display_duration(now, inner.state);
                DurationCheckpoint::new(now, frozen)
            };
            inner.checkpoint = checkpoint;
            inner.state = next;
            if starting_fresh {
                inner.metrics = None;
            }
            checkpoint
        };
        let _ = self.events.send(SessionEvent::CheckpointUpdated { checkpoint });
        let _ = self.events.send(SessionEvent::StateChanged { state: next });
    }
}

#[async_trait]
impl ExerciseService for SimExerciseService {
    async fn start_session(&self) -> Result<(), SessionError> {
        self.transition(SessionState::Active);
        Ok(())
    }

    async fn pause_session(&self) -> Result<(), SessionError> {
        self.transition(SessionState::Paused);
        Ok(())
    }

    async fn resume_session(&self) -> Result<(), SessionError> {
        self.transition(SessionState::Active);
        Ok(())
    }

    async fn end_session(&self) -> Result<(), SessionError> {
        self.transition(SessionState::Ended);
        Ok(())
    }

    async fn is_session_in_progress_elsewhere(&self) -> bool {
        self.tracking_elsewhere.load(Ordering::SeqCst)
    }

    async fn is_session_in_progress(&self) -> bool {
        !self.state().is_ended()
    }

    fn current_capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn snapshot(&self) -> ServiceSnapshot {
        let inner = self.inner.lock().unwrap();
        ServiceSnapshot {
            state: inner.state,
            checkpoint: inner.checkpoint,
            metrics: inner.metrics.clone(),
        }
    }
}

// ── Alert cues ───────────────────────────────────────────────────────

/// Observable playback lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCueEvent {
    Acquired(Instant),
    Started(Instant),
    Released(Instant),
}

/// Cue source whose cues "sound" for a fixed duration on the tokio clock.
pub struct SimCueSource {
    cue_duration: Duration,
    fail_acquire: bool,
    log: Arc<Mutex<Vec<SimCueEvent>>>,
}

impl SimCueSource {
    pub fn new(cue_duration: Duration) -> Self {
        Self {
            cue_duration,
            fail_acquire: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source whose every acquire fails.
    pub fn failing() -> Self {
        Self {
            cue_duration: Duration::ZERO,
            fail_acquire: true,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self) -> Vec<SimCueEvent> {
        self.log.lock().unwrap().clone()
    }

    /// Number of cues that were started.
    pub fn started_count(&self) -> usize {
        self.log()
            .iter()
            .filter(|e| matches!(e, SimCueEvent::Started(_)))
            .count()
    }
}

#[async_trait]
impl CueSource for SimCueSource {
    async fn acquire(&self) -> Result<Box<dyn CueHandle>, AlertError> {
        if self.fail_acquire {
            return Err(AlertError::AcquireFailed("simulated failure".into()));
        }
        self.log.lock().unwrap().push(SimCueEvent::Acquired(Instant::now()));
        Ok(Box::new(SimCue {
            cue_duration: self.cue_duration,
            finish_at: None,
            log: Arc::clone(&self.log),
        }))
    }
}

struct SimCue {
    cue_duration: Duration,
    finish_at: Option<Instant>,
    log: Arc<Mutex<Vec<SimCueEvent>>>,
}

#[async_trait]
impl CueHandle for SimCue {
    async fn start(&mut self) -> Result<(), AlertError> {
        let now = Instant::now();
        self.finish_at = Some(now + self.cue_duration);
        self.log.lock().unwrap().push(SimCueEvent::Started(now));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.finish_at {
            Some(finish) => Instant::now() < finish,
            None => false,
        }
    }
}

impl Drop for SimCue {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(SimCueEvent::Released(Instant::now()));
    }
}

// ── Wake resource ────────────────────────────────────────────────────

/// Wake source counting acquires and releases.
pub struct SimWakeSource {
    fail: bool,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl SimWakeSource {
    pub fn new() -> Self {
        Self {
            fail: false,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Default for SimWakeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WakeSource for SimWakeSource {
    async fn acquire(&self, _max_hold: Duration) -> Result<Box<dyn WakeGuard>, WakeError> {
        if self.fail {
            return Err(WakeError::AcquireFailed("simulated failure".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimWakeGuard {
            released: Arc::clone(&self.released),
        }))
    }
}

struct SimWakeGuard {
    released: Arc<AtomicUsize>,
}

impl WakeGuard for SimWakeGuard {}

impl Drop for SimWakeGuard {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
