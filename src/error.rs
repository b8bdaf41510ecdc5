//! Error taxonomy for the capture workflow and its collaborators

use std::fmt;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which platform permission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Camera,
    Location,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Camera => write!(f, "camera"),
            PermissionKind::Location => write!(f, "location"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Photo capture failed
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(PermissionKind),

    /// Permission was granted but no position could be read
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Transport failure or timeout talking to the inference endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Inference endpoint answered with a non-success status or a bad payload
    #[error("Service error: {0}")]
    Service(String),

    /// Object store upload failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document store write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A workflow run is already in progress
    #[error("Workflow busy in state {0}")]
    Busy(&'static str),

    /// Confirm or decline requested while no result is awaiting confirmation
    #[error("Nothing to confirm in state {0}")]
    NotAwaitingConfirmation(&'static str),

    #[error("Config error: {0}")]
    Config(String),
}

/// Extension trait for logging an error with context and folding it into the taxonomy
pub trait LogErr<T> {
    fn log_as(self, context: &str, kind: fn(String) -> Error) -> Result<T>;
}

impl<T, E: fmt::Display> LogErr<T> for std::result::Result<T, E> {
    fn log_as(self, context: &str, kind: fn(String) -> Error) -> Result<T> {
        self.map_err(|e| {
            log::error!("{}: {}", context, e);
            kind(format!("{}: {}", context, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_as_wraps_context_into_variant() {
        let res: std::result::Result<(), &str> = Err("bucket quota exceeded");
        let err = res.log_as("Upload issue image", Error::Storage).unwrap_err();
        assert!(matches!(err, Error::Storage(ref msg) if msg == "Upload issue image: bucket quota exceeded"));
    }

    #[test]
    fn permission_denied_names_the_permission() {
        let err = Error::PermissionDenied(PermissionKind::Location);
        assert_eq!(err.to_string(), "Permission denied: location");
    }
}
