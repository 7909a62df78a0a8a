//! Edge-triggered auto-termination policy.

use std::time::Duration;

use crate::session::checkpoint::SessionState;

/// Fires exactly once per session when elapsed active duration crosses
/// the configured threshold.
///
/// Crossing is detected by edge, not level: the fired flag is set the
/// moment `elapsed > threshold` is first observed, so repeated
/// recomputation above the threshold cannot re-fire, and the flag is set
/// before the caller performs any side effects so re-entrant
/// recomputation during those side effects is harmless. The comparison is
/// strict `>`; a duration exactly equal to the threshold does not fire.
#[derive(Debug)]
pub struct AutoTerminationPolicy {
    threshold: Duration,
    fired: bool,
}

impl AutoTerminationPolicy {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            fired: false,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Evaluate one recomputed duration. Returns true exactly when the
    /// termination action must run now.
    ///
    /// Only an active session can terminate; paused and ended sessions
    /// never evaluate the threshold.
    pub fn should_fire(&mut self, elapsed: Duration, state: SessionState) -> bool {
        if self.fired || !state.is_active() {
            return false;
        }
        if elapsed > self.threshold {
            self.fired = true;
            return true;
        }
        false
    }

    /// Re-arm for a new session. Called on the Ended-to-non-Ended edge.
    pub fn reset(&mut self) {
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AutoTerminationPolicy {
        AutoTerminationPolicy::new(Duration::from_secs(30))
    }

    #[test]
    fn below_threshold_never_fires() {
        let mut p = policy();
        assert!(!p.should_fire(Duration::from_secs(29), SessionState::Active));
        assert!(!p.has_fired());
    }

    #[test]
    fn exactly_at_threshold_does_not_fire() {
        let mut p = policy();
        assert!(!p.should_fire(Duration::from_secs(30), SessionState::Active));
        assert!(!p.has_fired());
    }

    #[test]
    fn fires_exactly_once_above_threshold() {
        let mut p = policy();
        assert!(p.should_fire(Duration::from_secs(31), SessionState::Active));
        assert!(p.has_fired());
        assert!(!p.should_fire(Duration::from_secs(40), SessionState::Active));
        assert!(!p.should_fire(Duration::from_secs(400), SessionState::Active));
    }

    #[test]
    fn non_active_states_never_fire() {
        let mut p = policy();
        assert!(!p.should_fire(Duration::from_secs(100), SessionState::Paused));
        assert!(!p.should_fire(Duration::from_secs(100), SessionState::Ended));
        assert!(!p.has_fired());
    }

    #[test]
    fn reset_rearms_for_new_session() {
        let mut p = policy();
        assert!(p.should_fire(Duration::from_secs(31), SessionState::Active));
        p.reset();
        assert!(!p.has_fired());
        assert!(p.should_fire(Duration::from_secs(31), SessionState::Active));
    }
}
