use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tokio::sync::mpsc;

use exertrack_core::sim::{SimCueSource, SimExerciseService, SimWakeSource};
use exertrack_core::{
    DisplayEvent, SessionConfig, SessionController, SessionEvent, StartEndLabel,
};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a simulated session and print display events as JSON lines
    /// until auto-termination fires
    Run {
        /// Auto-termination threshold in seconds
        #[arg(long, default_value = "30")]
        threshold_secs: u64,
        /// Chronometer tick cadence in milliseconds
        #[arg(long, default_value = "200")]
        tick_ms: u64,
        /// Pause the session this many seconds in (optional)
        #[arg(long)]
        pause_at: Option<u64>,
        /// Resume this many seconds after pausing (requires --pause-at)
        #[arg(long)]
        resume_after: Option<u64>,
        /// Give up after this many seconds of wall time
        #[arg(long, default_value = "600")]
        max_secs: u64,
    },
}

pub async fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            threshold_secs,
            tick_ms,
            pause_at,
            resume_after,
            max_secs,
        } => {
            let config = SessionConfig {
                auto_end_threshold_secs: threshold_secs,
                tick_interval_ms: tick_ms,
                ..SessionConfig::default()
            };
            config.validate()?;

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (display_tx, mut display_rx) = mpsc::unbounded_channel();
            let service = Arc::new(SimExerciseService::new(events_tx.clone()));
            let mut controller = SessionController::new(
                config,
                events_tx.clone(),
                display_tx,
                Arc::new(SimCueSource::new(Duration::from_millis(300))),
                Arc::new(SimWakeSource::new()),
            );
            controller.bind(service);
            let engine = tokio::spawn(controller.run(events_rx));

            events_tx.send(SessionEvent::StartEndPressed)?;

            // Script the optional pause/resume from a side task.
            if let Some(pause_secs) = pause_at {
                let requests = events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(pause_secs)).await;
                    let _ = requests.send(SessionEvent::PauseResumePressed);
                    if let Some(resume_secs) = resume_after {
                        tokio::time::sleep(Duration::from_secs(resume_secs)).await;
                        let _ = requests.send(SessionEvent::PauseResumePressed);
                    }
                });
            }

            let deadline = tokio::time::Instant::now() + Duration::from_secs(max_secs);
            let mut auto_ended = false;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => break,
                    event = display_rx.recv() => match event {
                        Some(event) => {
                            println!("{}", serde_json::to_string(&event)?);
                            if matches!(event, DisplayEvent::AutoEnded { .. }) {
                                auto_ended = true;
                            }
                            // Stop once the post-termination button state lands.
                            if auto_ended
                                && matches!(event, DisplayEvent::ButtonsUpdated { buttons, .. }
                                    if buttons.start_end == StartEndLabel::Start)
                            {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }

            engine.abort();
            Ok(())
        }
    }
}
