//! Session controller: the single consumer that owns all session state.
//!
//! Every stimulus -- service stream deliveries, button presses,
//! chronometer ticks, ambient transitions -- arrives as a
//! [`SessionEvent`] and is handled here, one at a time, in arrival order.
//! The controller never assigns session state on its own; it issues
//! requests to the exercise service and waits for the authoritative state
//! to come back on the stream.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::alert::{AlertSequencer, CueSource};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{AmbientEvent, ButtonState, DisplayEvent, SessionEvent};
use crate::format;
use crate::metrics::{MetricKind, MetricSnapshot};
use crate::service::ExerciseService;
use crate::session::checkpoint::{DurationCheckpoint, SessionState};
use crate::session::chronometer::Chronometer;
use crate::session::termination::AutoTerminationPolicy;
use crate::wake::{self, WakeSource};

/// Aggregate of all mutable session state.
///
/// `previous_state` exists solely to detect the Ended-to-non-Ended edge
/// and is updated only together with `current_state`.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub id: Uuid,
    pub current_state: SessionState,
    pub previous_state: SessionState,
    pub checkpoint: DurationCheckpoint,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            current_state: SessionState::Ended,
            previous_state: SessionState::Ended,
            checkpoint: DurationCheckpoint::zero(Utc::now()),
        }
    }
}

/// Last formatted metric values shown on the display.
///
/// Metric deliveries are sparse; fields absent from a delivery keep their
/// previously displayed value until the display is reset for a new
/// session.
#[derive(Debug, Clone)]
struct MetricDisplay {
    heart_rate: String,
    distance_km: String,
    steps: String,
}

impl Default for MetricDisplay {
    fn default() -> Self {
        Self {
            heart_rate: format::EMPTY_METRIC.into(),
            distance_km: format::EMPTY_METRIC.into(),
            steps: format::EMPTY_METRIC.into(),
        }
    }
}

impl MetricDisplay {
    fn merge(&mut self, metrics: &MetricSnapshot) {
        if let Some(bpm) = metrics.heart_rate_bpm {
            self.heart_rate = format::format_heart_rate(bpm);
        }
        if let Some(meters) = metrics.distance_meters {
            self.distance_km = format::format_distance_km(meters);
        }
        if let Some(steps) = metrics.steps {
            self.steps = format::format_steps(steps);
        }
    }
}

/// Top-level coordinator for one bound UI surface.
pub struct SessionController {
    config: SessionConfig,
    session: Session,
    service: Option<Arc<dyn ExerciseService>>,
    chronometer: Chronometer,
    termination: AutoTerminationPolicy,
    sequencer: AlertSequencer,
    cue_source: Arc<dyn CueSource>,
    wake_source: Arc<dyn WakeSource>,
    metric_display: MetricDisplay,
    ambient: bool,
    events_tx: UnboundedSender<SessionEvent>,
    display_tx: UnboundedSender<DisplayEvent>,
    teardown: CancellationToken,
}

impl SessionController {
    /// Build a controller. `events_tx` must be the sender side of the
    /// channel whose receiver is passed to [`run`](Self::run) (the
    /// chronometer delivers its ticks through it); `display_tx` receives
    /// everything the UI should render.
    pub fn new(
        config: SessionConfig,
        events_tx: UnboundedSender<SessionEvent>,
        display_tx: UnboundedSender<DisplayEvent>,
        cue_source: Arc<dyn CueSource>,
        wake_source: Arc<dyn WakeSource>,
    ) -> Self {
        let termination = AutoTerminationPolicy::new(config.auto_end_threshold());
        let sequencer = AlertSequencer::from_config(&config);
        Self {
            config,
            session: Session::new(),
            service: None,
            chronometer: Chronometer::new(),
            termination,
            sequencer,
            cue_source,
            wake_source,
            metric_display: MetricDisplay::default(),
            ambient: false,
            events_tx,
            display_tx,
            teardown: CancellationToken::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_bound(&self) -> bool {
        self.service.is_some()
    }

    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    pub fn chronometer_running(&self) -> bool {
        self.chronometer.is_running()
    }

    pub fn auto_end_fired(&self) -> bool {
        self.termination.has_fired()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Bind to the exercise service. Publishes metric availability so the
    /// UI can disable fields the device cannot populate.
    pub fn bind(&mut self, service: Arc<dyn ExerciseService>) {
        let capabilities = service.current_capabilities();
        self.publish(DisplayEvent::MetricAvailability {
            heart_rate: capabilities.contains(&MetricKind::HeartRate),
            distance: capabilities.contains(&MetricKind::Distance),
            steps: capabilities.contains(&MetricKind::Steps),
            at: Utc::now(),
        });
        self.publish(DisplayEvent::ButtonsUpdated {
            buttons: ButtonState::for_state(self.session.current_state),
            at: Utc::now(),
        });
        self.service = Some(service);
        debug!("bound to exercise service");
    }

    /// Disconnect from the exercise service and tear down the recurring
    /// work: the chronometer is stopped and any in-flight alert sequence
    /// is cancelled.
    pub fn unbind(&mut self) {
        self.chronometer.stop();
        self.teardown.cancel();
        self.teardown = CancellationToken::new();
        self.service = None;
        debug!("unbound from exercise service");
    }

    /// Consume events until the channel closes, then tear down.
    pub async fn run(mut self, mut events_rx: UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events_rx.recv().await {
            if let Err(e) = self.handle(event).await {
                error!(error = %e, "event handling failed");
            }
        }
        self.unbind();
    }

    // ── Event handling ───────────────────────────────────────────────

    pub async fn handle(&mut self, event: SessionEvent) -> Result<()> {
        // The live subscription is down while ambient: stream deliveries
        // and stale ticks are dropped. The one-shot refreshes on ambient
        // entry/update/exit resync from the service snapshot, and
        // threshold evaluation resumes only after ambient exit.
        if self.ambient && Self::is_live_delivery(&event) {
            return Ok(());
        }
        match event {
            SessionEvent::StateChanged { state } => {
                self.apply_state(state);
                Ok(())
            }
            SessionEvent::CheckpointUpdated { checkpoint } => {
                // Replaced wholesale; the chronometer picks it up on its
                // own regularly-timed ticks.
                self.session.checkpoint = checkpoint;
                Ok(())
            }
            SessionEvent::MetricsUpdated { metrics } => {
                self.metric_display.merge(&metrics);
                self.publish_metrics();
                self.evaluate_termination().await
            }
            SessionEvent::ChronoTick => {
                self.publish_elapsed(Utc::now());
                self.evaluate_termination().await
            }
            SessionEvent::Ambient { event } => self.handle_ambient(event),
            SessionEvent::StartEndPressed => self.start_end_session().await,
            SessionEvent::PauseResumePressed => self.pause_resume_session().await,
        }
    }

    fn is_live_delivery(event: &SessionEvent) -> bool {
        matches!(
            event,
            SessionEvent::StateChanged { .. }
                | SessionEvent::CheckpointUpdated { .. }
                | SessionEvent::MetricsUpdated { .. }
                | SessionEvent::ChronoTick
        )
    }

    /// Apply an authoritative state delivery.
    fn apply_state(&mut self, state: SessionState) {
        let previous = self.session.current_state;
        if previous.is_ended() && !state.is_ended() {
            // A new session begins: mint an identity, re-arm the
            // termination policy, and clear the displayed fields before
            // any new metric arrives.
            self.session.id = Uuid::new_v4();
            self.termination.reset();
            self.metric_display = MetricDisplay::default();
            self.publish(DisplayEvent::DisplayReset {
                session_id: self.session.id,
                at: Utc::now(),
            });
            self.publish_metrics();
            info!(session_id = %self.session.id, "new session started");
        }

        // The chronometer loop only runs while active and interactive;
        // ambient refreshes are one-shot.
        if state.is_active() && !self.ambient {
            self.chronometer
                .start(self.config.tick_interval(), self.events_tx.clone());
        } else {
            self.chronometer.stop();
        }

        self.publish(DisplayEvent::ButtonsUpdated {
            buttons: ButtonState::for_state(state),
            at: Utc::now(),
        });

        self.session.previous_state = previous;
        self.session.current_state = state;
    }

    async fn start_end_session(&mut self) -> Result<()> {
        if self.session.current_state.is_ended() {
            self.try_start_session().await
        } else {
            let service = self.service("end_session")?;
            service.end_session().await?;
            Ok(())
        }
    }

    async fn try_start_session(&mut self) -> Result<()> {
        let service = self.service("start_session")?;
        if service.is_session_in_progress_elsewhere().await {
            // Not an error; the UI routes to a confirmation flow.
            self.publish(DisplayEvent::ConfirmationRequired { at: Utc::now() });
            return Ok(());
        }
        if service.is_session_in_progress().await {
            return Ok(());
        }
        service.start_session().await?;
        Ok(())
    }

    async fn pause_resume_session(&mut self) -> Result<()> {
        let service = self.service("pause_resume")?;
        if self.session.current_state.is_paused() {
            service.resume_session().await?;
        } else {
            service.pause_session().await?;
        }
        Ok(())
    }

    fn handle_ambient(&mut self, event: AmbientEvent) -> Result<()> {
        match event {
            AmbientEvent::Enter => {
                self.ambient = true;
                self.chronometer.stop();
                self.publish(DisplayEvent::AmbientChanged {
                    ambient: true,
                    at: Utc::now(),
                });
                self.one_shot_refresh()
            }
            AmbientEvent::Exit => {
                self.ambient = false;
                let refreshed = self.one_shot_refresh();
                self.publish(DisplayEvent::AmbientChanged {
                    ambient: false,
                    at: Utc::now(),
                });
                refreshed
            }
            AmbientEvent::Update => self.one_shot_refresh(),
        }
    }

    /// Synchronous refresh of all displayed fields from the service's
    /// current snapshot. Used in ambient mode where no live subscription
    /// or tick loop runs.
    fn one_shot_refresh(&mut self) -> Result<()> {
        let service = self.service("snapshot")?;
        let snapshot = service.snapshot();
        self.apply_state(snapshot.state);
        self.session.checkpoint = snapshot.checkpoint;
        if let Some(metrics) = snapshot.metrics {
            self.metric_display.merge(&metrics);
        }
        self.publish_metrics();
        self.publish_elapsed(Utc::now());
        Ok(())
    }

    // ── Auto-termination ─────────────────────────────────────────────

    async fn evaluate_termination(&mut self) -> Result<()> {
        let now = Utc::now();
        let elapsed = self
            .session
            .checkpoint
            .display_duration(now, self.session.current_state);
        if !self
            .termination
            .should_fire(elapsed, self.session.current_state)
        {
            return Ok(());
        }
        info!(
            elapsed_secs = elapsed.as_secs(),
            threshold_secs = self.termination.threshold().as_secs(),
            "active duration exceeded threshold; ending session"
        );

        // End request first. It is asynchronous; the authoritative Ended
        // state arrives later on the stream, so the remaining side effects
        // run without waiting for it.
        let service = self.service("end_session")?;
        tokio::spawn(async move {
            if let Err(e) = service.end_session().await {
                error!(error = %e, "auto end request failed");
            }
        });

        wake::acquire_then_release(&*self.wake_source, self.config.wake_hold()).await;

        // Final refresh so the face shows the duration at the termination
        // instant rather than the last cadence tick.
        self.publish_elapsed(Utc::now());
        self.publish(DisplayEvent::AutoEnded {
            session_id: self.session.id,
            elapsed_ms: elapsed.as_millis() as u64,
            at: Utc::now(),
        });

        self.sequencer.run(&*self.cue_source, &self.teardown).await;
        Ok(())
    }

    // ── Publishing ───────────────────────────────────────────────────

    fn publish_elapsed(&self, now: DateTime<Utc>) {
        let elapsed = self
            .session
            .checkpoint
            .display_duration(now, self.session.current_state);
        self.publish(DisplayEvent::ElapsedUpdated {
            formatted: format::format_elapsed(elapsed, !self.ambient),
            elapsed_ms: elapsed.as_millis() as u64,
            at: now,
        });
    }

    fn publish_metrics(&self) {
        self.publish(DisplayEvent::MetricsUpdated {
            heart_rate: self.metric_display.heart_rate.clone(),
            distance_km: self.metric_display.distance_km.clone(),
            steps: self.metric_display.steps.clone(),
            at: Utc::now(),
        });
    }

    fn publish(&self, event: DisplayEvent) {
        // The display side may be gone during teardown; that is fine.
        let _ = self.display_tx.send(event);
    }

    fn service(&self, request: &'static str) -> Result<Arc<dyn ExerciseService>, SessionError> {
        self.service
            .clone()
            .ok_or(SessionError::ServiceNotBound { request })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::sim::{SimCueSource, SimExerciseService, SimWakeSource};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Harness {
        controller: SessionController,
        service: Arc<SimExerciseService>,
        events_rx: UnboundedReceiver<SessionEvent>,
        display_rx: UnboundedReceiver<DisplayEvent>,
    }

    fn harness(config: SessionConfig) -> Harness {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (display_tx, display_rx) = mpsc::unbounded_channel();
        let service = Arc::new(SimExerciseService::new(events_tx.clone()));
        let mut controller = SessionController::new(
            config,
            events_tx,
            display_tx,
            Arc::new(SimCueSource::new(Duration::from_millis(300))),
            Arc::new(SimWakeSource::new()),
        );
        controller.bind(service.clone());
        Harness {
            controller,
            service,
            events_rx,
            display_rx,
        }
    }

    /// Drain and handle every event the service has delivered so far.
    async fn pump(h: &mut Harness) {
        while let Ok(ev) = h.events_rx.try_recv() {
            h.controller.handle(ev).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_press_requests_session_start() {
        let mut h = harness(SessionConfig::test_profile());
        h.controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap();
        assert!(h.service.state().is_active());

        pump(&mut h).await;
        assert!(h.controller.session().current_state.is_active());
        assert!(h.controller.chronometer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_elsewhere_routes_to_confirmation() {
        let mut h = harness(SessionConfig::test_profile());
        h.service.set_tracking_elsewhere(true);
        h.controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap();
        // No start request was issued.
        assert!(h.service.state().is_ended());

        let mut saw_confirmation = false;
        while let Ok(ev) = h.display_rx.try_recv() {
            if matches!(ev, DisplayEvent::ConfirmationRequired { .. }) {
                saw_confirmation = true;
            }
        }
        assert!(saw_confirmation);
    }

    #[tokio::test(start_paused = true)]
    async fn unbound_request_is_precondition_violation() {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (display_tx, _display_rx) = mpsc::unbounded_channel();
        let mut controller = SessionController::new(
            SessionConfig::test_profile(),
            events_tx,
            display_tx,
            Arc::new(SimCueSource::new(Duration::from_millis(300))),
            Arc::new(SimWakeSource::new()),
        );
        let err = controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Session(SessionError::ServiceNotBound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_round_trip() {
        let mut h = harness(SessionConfig::test_profile());
        h.controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap();
        pump(&mut h).await;

        h.controller
            .handle(SessionEvent::PauseResumePressed)
            .await
            .unwrap();
        pump(&mut h).await;
        assert!(h.controller.session().current_state.is_paused());
        assert!(!h.controller.chronometer_running());

        h.controller
            .handle(SessionEvent::PauseResumePressed)
            .await
            .unwrap();
        pump(&mut h).await;
        assert!(h.controller.session().current_state.is_active());
        assert!(h.controller.chronometer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ended_to_active_edge_resets_display_and_policy() {
        let mut h = harness(SessionConfig::test_profile());
        let first_id = h.controller.session().id;

        h.controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap();
        pump(&mut h).await;
        assert_ne!(h.controller.session().id, first_id);

        let mut saw_reset = false;
        while let Ok(ev) = h.display_rx.try_recv() {
            if matches!(ev, DisplayEvent::DisplayReset { .. }) {
                saw_reset = true;
            }
        }
        assert!(saw_reset);
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_entry_stops_chronometer() {
        let mut h = harness(SessionConfig::test_profile());
        h.controller
            .handle(SessionEvent::StartEndPressed)
            .await
            .unwrap();
        pump(&mut h).await;
        assert!(h.controller.chronometer_running());

        h.controller
            .handle(SessionEvent::Ambient {
                event: AmbientEvent::Enter,
            })
            .await
            .unwrap();
        assert!(h.controller.is_ambient());
        assert!(!h.controller.chronometer_running());

        // Periodic ambient update refreshes without restarting the loop.
        h.controller
            .handle(SessionEvent::Ambient {
                event: AmbientEvent::Update,
            })
            .await
            .unwrap();
        assert!(!h.controller.chronometer_running());

        h.controller
            .handle(SessionEvent::Ambient {
                event: AmbientEvent::Exit,
            })
            .await
            .unwrap();
        assert!(!h.controller.is_ambient());
        assert!(h.controller.chronometer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_replaced_wholesale() {
        let mut h = harness(SessionConfig::test_profile());
        let cp = DurationCheckpoint::new(Utc::now(), Duration::from_secs(12));
        h.controller
            .handle(SessionEvent::CheckpointUpdated { checkpoint: cp })
            .await
            .unwrap();
        assert_eq!(h.controller.session().checkpoint, cp);
    }
}
