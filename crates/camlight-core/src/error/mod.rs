use std::fmt;

use error_location::ErrorLocation;
use thiserror::Error;

/// Category of a camera acquisition failure.
///
/// Rendered into user-facing notifications, so the `Display` form is the
/// short category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraErrorKind {
    /// Access to the camera was refused.
    NotAllowed,
    /// No device matched the request.
    NotFound,
    /// The requested device exists but the constraint cannot be satisfied.
    Overconstrained,
    /// The device exists but could not be opened or read.
    NotReadable,
    /// Acquisition was interrupted before a session was established.
    Aborted,
}

impl fmt::Display for CameraErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraErrorKind::NotAllowed => "NotAllowedError",
            CameraErrorKind::NotFound => "NotFoundError",
            CameraErrorKind::Overconstrained => "OverconstrainedError",
            CameraErrorKind::NotReadable => "NotReadableError",
            CameraErrorKind::Aborted => "AbortError",
        };
        f.write_str(name)
    }
}

/// Pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The platform lacks a capability the pipeline needs.
    #[error("{capability} not supported on this platform {location}")]
    CapabilityUnsupported {
        /// Name of the missing capability.
        capability: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Camera enumeration or acquisition failed.
    #[error("Camera error: {kind} {reason} {location}")]
    Camera {
        /// Failure category.
        kind: CameraErrorKind,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No usable frame could be read from the active session.
    #[error("Frame unavailable: {reason} {location}")]
    FrameUnavailable {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The color request never produced a response.
    #[error("Transport error: {reason} {location}")]
    Transport {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Preference storage failed.
    #[error("Storage error: {reason} {location}")]
    Storage {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Text shown to the user for this error, without the source location.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::CapabilityUnsupported { capability, .. } => {
                format!("{} not supported on this platform", capability)
            }
            CoreError::Camera { kind, reason, .. } => format!("{}: {}", kind, reason),
            CoreError::FrameUnavailable { reason, .. }
            | CoreError::Transport { reason, .. }
            | CoreError::Storage { reason, .. } => reason.clone(),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
