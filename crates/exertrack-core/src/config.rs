//! TOML-based engine configuration.
//!
//! Tunables for the session engine:
//! - Chronometer tick cadence
//! - Auto-termination threshold
//! - Alert sequence shape (cue count, delays)
//! - Wake hold duration
//!
//! The host application decides where the TOML lives; this module only
//! parses and validates it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Engine configuration.
///
/// All durations are stored as integer milliseconds/seconds so the struct
/// round-trips cleanly through TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Foreground chronometer cadence in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Active duration after which the session is ended automatically,
    /// in seconds. Crossing is strict `>`, so a session of exactly this
    /// length does not trigger termination.
    #[serde(default = "default_auto_end_threshold_secs")]
    pub auto_end_threshold_secs: u64,
    /// Number of alert cues played when auto-termination fires.
    #[serde(default = "default_alert_cue_count")]
    pub alert_cue_count: u32,
    /// Settle delay between consecutive alert cues, in milliseconds.
    #[serde(default = "default_inter_cue_delay_ms")]
    pub inter_cue_delay_ms: u64,
    /// Poll interval while waiting for a cue to finish, in milliseconds.
    #[serde(default = "default_cue_poll_interval_ms")]
    pub cue_poll_interval_ms: u64,
    /// Maximum hold on the transient wake resource, in milliseconds.
    #[serde(default = "default_wake_hold_ms")]
    pub wake_hold_ms: u64,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    200
}
fn default_auto_end_threshold_secs() -> u64 {
    360
}
fn default_alert_cue_count() -> u32 {
    2
}
fn default_inter_cue_delay_ms() -> u64 {
    200
}
fn default_cue_poll_interval_ms() -> u64 {
    100
}
fn default_wake_hold_ms() -> u64 {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_end_threshold_secs: default_auto_end_threshold_secs(),
            alert_cue_count: default_alert_cue_count(),
            inter_cue_delay_ms: default_inter_cue_delay_ms(),
            cue_poll_interval_ms: default_cue_poll_interval_ms(),
            wake_hold_ms: default_wake_hold_ms(),
        }
    }
}

impl SessionConfig {
    /// Short-threshold profile used in tests and manual verification.
    pub fn test_profile() -> Self {
        Self {
            auto_end_threshold_secs: 30,
            ..Self::default()
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(s).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.cue_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cue_poll_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn auto_end_threshold(&self) -> Duration {
        Duration::from_secs(self.auto_end_threshold_secs)
    }

    pub fn inter_cue_delay(&self) -> Duration {
        Duration::from_millis(self.inter_cue_delay_ms)
    }

    pub fn cue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cue_poll_interval_ms)
    }

    pub fn wake_hold(&self) -> Duration {
        Duration::from_millis(self.wake_hold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SessionConfig::default();
        assert_eq!(c.tick_interval_ms, 200);
        assert_eq!(c.auto_end_threshold_secs, 360);
        assert_eq!(c.alert_cue_count, 2);
        assert_eq!(c.inter_cue_delay_ms, 200);
    }

    #[test]
    fn test_profile_shortens_threshold() {
        let c = SessionConfig::test_profile();
        assert_eq!(c.auto_end_threshold_secs, 30);
        assert_eq!(c.tick_interval_ms, 200);
    }

    #[test]
    fn toml_round_trip() {
        let c = SessionConfig::test_profile();
        let s = c.to_toml_string().unwrap();
        let back = SessionConfig::from_toml_str(&s).unwrap();
        assert_eq!(back.auto_end_threshold_secs, 30);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c = SessionConfig::from_toml_str("auto_end_threshold_secs = 42").unwrap();
        assert_eq!(c.auto_end_threshold_secs, 42);
        assert_eq!(c.tick_interval_ms, 200);
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let err = SessionConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
