//! Transient exclusive wake requests.
//!
//! Before the termination alert plays, the device is nudged awake by
//! briefly acquiring an exclusive wake resource. The hold is released
//! unconditionally: the guard returned by [`WakeSource::acquire`]
//! releases on drop, covering every exit path including panics unwinding
//! through the caller.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::WakeError;

/// Provider of the exclusive "keep display/CPU awake" resource.
#[async_trait]
pub trait WakeSource: Send + Sync {
    /// Acquire the wake resource for at most `max_hold`. The platform may
    /// release it earlier on its own; the returned guard releases it on
    /// drop regardless.
    async fn acquire(&self, max_hold: Duration) -> Result<Box<dyn WakeGuard>, WakeError>;
}

/// Held wake resource; released when dropped.
pub trait WakeGuard: Send {}

/// Acquire the wake resource and release it promptly.
///
/// Failures are logged and swallowed: a missed wake only risks the alert
/// playing against a dark display, which must not block termination.
pub async fn acquire_then_release(source: &dyn WakeSource, max_hold: Duration) {
    match source.acquire(max_hold).await {
        Ok(guard) => drop(guard),
        Err(e) => warn!(error = %e, "wake request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWakeSource;

    #[tokio::test]
    async fn acquire_then_release_balances() {
        let source = SimWakeSource::new();
        acquire_then_release(&source, Duration::from_secs(10)).await;
        assert_eq!(source.acquired_count(), 1);
        assert_eq!(source.released_count(), 1);
    }

    #[tokio::test]
    async fn failure_is_swallowed() {
        let source = SimWakeSource::failing();
        acquire_then_release(&source, Duration::from_secs(10)).await;
        assert_eq!(source.acquired_count(), 0);
        assert_eq!(source.released_count(), 0);
    }
}
