//! Recurring chronometer tick task.
//!
//! The chronometer does not recompute the duration itself; it delivers
//! [`SessionEvent::ChronoTick`] messages into the controller's channel at
//! the foreground cadence, and the controller recomputes and publishes on
//! its single consumer. In ambient mode no task runs at all -- the
//! controller performs one-shot refreshes on ambient entry/update instead.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::events::SessionEvent;

/// Owner of the single recurring tick task.
///
/// At most one task is alive at any time: `start` is a no-op while
/// running, and the cancellation token is held here so the task cannot
/// outlive its owner silently.
#[derive(Debug, Default)]
pub struct Chronometer {
    cancel: Option<CancellationToken>,
}

impl Chronometer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    /// Begin the tick loop. No-op if a loop is already running.
    pub fn start(&mut self, cadence: Duration, events: UnboundedSender<SessionEvent>) {
        if self.cancel.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(cadence) => {
                        if events.send(SessionEvent::ChronoTick).is_err() {
                            // Controller is gone; nothing left to tick for.
                            break;
                        }
                    }
                }
            }
        });
        self.cancel = Some(cancel);
    }

    /// Cancel the tick loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

impl Drop for Chronometer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_cadence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chrono = Chronometer::new();
        chrono.start(Duration::from_millis(200), tx);

        for _ in 0..3 {
            let ev = rx.recv().await.unwrap();
            assert!(matches!(ev, SessionEvent::ChronoTick));
        }
        chrono.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_single_flight() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chrono = Chronometer::new();
        chrono.start(Duration::from_millis(200), tx.clone());
        // Second start must not spawn a second loop.
        chrono.start(Duration::from_millis(200), tx);
        assert!(chrono.is_running());

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(210)).await;
        tokio::task::yield_now().await;
        assert!(rx.recv().await.is_some());
        // Exactly one tick per cadence window.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_prompt_and_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chrono = Chronometer::new();
        chrono.start(Duration::from_millis(200), tx);
        chrono.stop();
        chrono.stop();
        assert!(!chrono.is_running());

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chrono = Chronometer::new();
        chrono.start(Duration::from_millis(200), tx.clone());
        chrono.stop();
        chrono.start(Duration::from_millis(200), tx);
        assert!(chrono.is_running());
        assert!(rx.recv().await.is_some());
    }
}
