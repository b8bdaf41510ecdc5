use std::fmt;
use std::future::Future;

use crate::error::Result;
use crate::models::{CapturedImage, GeoPosition};

use super::state::{Phase, Review};

/// Device-side collaborators of the workflow: camera, location, and the user.
pub trait Platform {
    fn request_camera_permission(&self) -> impl Future<Output = bool> + Send;

    fn capture_photo(&self) -> impl Future<Output = Result<CapturedImage>> + Send;

    fn request_location_permission(&self) -> impl Future<Output = bool> + Send;

    /// Read the current position once. Only called after location permission was granted.
    fn current_position(&self) -> impl Future<Output = Result<GeoPosition>> + Send;

    /// Ask the user whether to report the reviewed result.
    fn confirm(&self, review: &Review) -> impl Future<Output = bool> + Send;

    fn notify(&self, notice: &Notice);

    fn phase_changed(&self, _phase: Phase) {}
}

/// User-visible notifications raised by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    CameraPermissionRequired,
    CaptureFailed,
    LocationPermissionRequired,
    LocationUnavailable,
    AnalysisFailed,
    UncertainDetection,
    ReportFailed,
    Reported,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Reported)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Notice::CameraPermissionRequired => "Camera access is required to scan an issue.",
            Notice::CaptureFailed => "Failed to capture photo",
            Notice::LocationPermissionRequired => "Location permission is required to report an issue.",
            Notice::LocationUnavailable => "Could not determine your location",
            Notice::AnalysisFailed => "AI analysis failed",
            Notice::UncertainDetection => "Uncertain detection. Please retake the image for better accuracy.",
            Notice::ReportFailed => "Failed to report issue",
            Notice::Reported => "Issue Reported Successfully",
        };
        f.write_str(message)
    }
}
