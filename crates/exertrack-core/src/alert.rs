//! Sequential alert cue playback.
//!
//! When auto-termination fires, a fixed number of alert cues is played
//! strictly one after another: each cue is acquired, started, polled to
//! completion, released, and followed by a settle delay before the next
//! acquire. The audio device is a black box behind [`CueSource`]; the
//! engine only starts playback and waits for completion.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::SessionConfig;
use crate::error::AlertError;

/// Factory for single-cue playback handles.
#[async_trait]
pub trait CueSource: Send + Sync {
    /// Acquire a playback handle for one cue.
    async fn acquire(&self) -> Result<Box<dyn CueHandle>, AlertError>;
}

/// One acquired playback resource.
///
/// Dropping the handle releases the underlying resource, so release is
/// guaranteed on every exit path including cancellation.
#[async_trait]
pub trait CueHandle: Send {
    /// Begin playback.
    async fn start(&mut self) -> Result<(), AlertError>;

    /// Whether the cue is still sounding.
    fn is_playing(&self) -> bool;
}

/// Plays a configured number of alert cues sequentially.
#[derive(Debug, Clone)]
pub struct AlertSequencer {
    cue_count: u32,
    inter_cue_delay: Duration,
    poll_interval: Duration,
}

impl AlertSequencer {
    pub fn new(cue_count: u32, inter_cue_delay: Duration, poll_interval: Duration) -> Self {
        Self {
            cue_count,
            inter_cue_delay,
            poll_interval,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.alert_cue_count,
            config.inter_cue_delay(),
            config.cue_poll_interval(),
        )
    }

    /// Run the sequence to completion, cancellation, or first failure.
    ///
    /// Acquire and playback failures are logged and abandon the remainder
    /// of the sequence; they never propagate, so session termination is
    /// not blocked by a broken audio path. Returns the number of cues that
    /// fully completed.
    pub async fn run(&self, source: &dyn CueSource, cancel: &CancellationToken) -> u32 {
        let mut played = 0;
        for index in 0..self.cue_count {
            if cancel.is_cancelled() {
                break;
            }
            let mut cue = match source.acquire().await {
                Ok(cue) => cue,
                Err(e) => {
                    warn!(cue = index, error = %e, "alert cue acquire failed; abandoning sequence");
                    break;
                }
            };
            if let Err(e) = cue.start().await {
                warn!(cue = index, error = %e, "alert cue playback failed; abandoning sequence");
                break;
            }
            // Poll the handle until the cue finishes sounding.
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return played,
                    _ = tokio::time::sleep(self.poll_interval) => {
                        if !cue.is_playing() {
                            break;
                        }
                    }
                }
            }
            drop(cue);
            played += 1;

            // Settle delay before starting the next cue.
            if index + 1 < self.cue_count {
                tokio::select! {
                    _ = cancel.cancelled() => return played,
                    _ = tokio::time::sleep(self.inter_cue_delay) => {}
                }
            }
        }
        played
    }
}
