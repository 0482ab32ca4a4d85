use crate::AppIdentity;

use error_location::ErrorLocation;
use thiserror::Error;

/// Audio session errors with source location tracking.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Audio sessions could not be listed (no device, COM failure, unsupported OS).
    #[error("Audio session enumeration failed: {reason} {location}")]
    EnumerationFailed {
        /// Description of the enumeration failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The application has no live audio endpoint in the current snapshot.
    #[error("No audio session found for '{identity}' {location}")]
    SessionNotFound {
        /// Identity that was looked up.
        identity: AppIdentity,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading or writing a single endpoint failed.
    #[error("Endpoint control failed for {process} (pid {pid}): {reason} {location}")]
    EndpointControl {
        /// Executable name of the endpoint's process.
        process: String,
        /// Process id of the endpoint's process.
        pid: u32,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Every endpoint of an identity rejected a fan-out write.
    #[error("All {failed} endpoint(s) of '{identity}' failed to update {location}")]
    FanOutFailed {
        /// Identity the write was addressed to.
        identity: AppIdentity,
        /// Number of endpoints that failed.
        failed: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Volume step outside of (0.0, 1.0].
    #[error("Invalid volume step {step}: must be within (0.0, 1.0] {location}")]
    InvalidStep {
        /// The rejected step.
        step: f64,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Action tag is not one of the recognised volume actions.
    #[error("Unknown volume action '{action}' {location}")]
    UnknownAction {
        /// The rejected tag.
        action: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl AudioError {
    /// True when the error means "the application is not producing audio right now".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AudioError::SessionNotFound { .. })
    }
}

/// Result type alias using [`AudioError`].
pub type Result<T> = std::result::Result<T, AudioError>;
