//! Core error types for exertrack-core.
//!
//! This module defines the error hierarchy using thiserror. Only
//! [`SessionError::ServiceNotBound`] is ever surfaced to the user as a hard
//! failure; alert and wake failures are recovered locally by the components
//! that raise them.

use thiserror::Error;

/// Core error type for exertrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Alert playback errors
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// Wake resource errors
    #[error("Wake error: {0}")]
    Wake(#[from] WakeError),
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A service request was issued before the controller was bound to the
    /// exercise service. Indicates a lifecycle bug upstream; the requested
    /// action is aborted and not retried.
    #[error("Exercise service is not bound; cannot issue '{request}' request")]
    ServiceNotBound { request: &'static str },

    /// The exercise service rejected or failed a request.
    #[error("Exercise service request '{request}' failed: {message}")]
    RequestFailed {
        request: &'static str,
        message: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Alert playback errors. Always recovered locally: the sequence is
/// abandoned and the session flow continues.
#[derive(Error, Debug)]
pub enum AlertError {
    /// Could not acquire a playback handle for a cue
    #[error("Failed to acquire alert cue: {0}")]
    AcquireFailed(String),

    /// Playback of an acquired cue failed
    #[error("Alert cue playback failed: {0}")]
    PlaybackFailed(String),
}

/// Wake resource errors. Recovered locally: a missed wake degrades to the
/// alert possibly playing on a dark display.
#[derive(Error, Debug)]
pub enum WakeError {
    /// Could not acquire the exclusive wake resource
    #[error("Failed to acquire wake resource: {0}")]
    AcquireFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
