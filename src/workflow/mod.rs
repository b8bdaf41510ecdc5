//! Capture workflow controller.
//!
//! Drives one report at a time through
//! `Idle -> Capturing -> LocationPending -> Inferring -> AwaitingConfirmation -> Persisting -> Done`.
//! Every collaborator failure is turned into a single [`Notice`], logged, and
//! resets the run to `Idle`. Nothing is retried.

mod platform;
mod state;


use std::time::Duration;

use chrono::Utc;

use crate::constants::{DEFAULT_MIN_CONFIDENCE_PERCENT, DEFAULT_SUCCESS_DWELL_MS};
use crate::error::{Error, PermissionKind, Result};
use crate::inference::Classifier;
use crate::models::{Assessment, NewIssueReport, ReportId};
use crate::services::repository::ReportRepository;
use crate::storage::ImageStore;

pub use platform::{Notice, Platform};
pub use state::{Phase, Review, WorkflowState};

#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    /// Results strictly below this percentage are rejected
    pub min_confidence_percent: f64,
    /// How long `Done` is held before resetting
    pub success_dwell: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            min_confidence_percent: DEFAULT_MIN_CONFIDENCE_PERCENT,
            success_dwell: Duration::from_millis(DEFAULT_SUCCESS_DWELL_MS),
        }
    }
}

/// Result of a capture request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Waiting on the user to confirm or decline
    Ready(Review),
    /// Classifier confidence too low; all captured state was discarded
    Rejected(Assessment),
}

/// Result of a full interactive run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Reported(ReportId),
    Rejected(Assessment),
    Declined,
}

/// Whether the workflow already told the user about `err` through a [`Notice`].
///
/// Only misuse of the controller itself (busy, nothing to confirm) goes unannounced.
pub fn is_notified(err: &Error) -> bool {
    !matches!(err, Error::Busy(_) | Error::NotAwaitingConfirmation(_))
}

pub struct CaptureWorkflow<P, C, S, R> {
    platform: P,
    classifier: C,
    images: S,
    reports: R,
    settings: WorkflowSettings,
    state: WorkflowState,
}

impl<P, C, S, R> CaptureWorkflow<P, C, S, R>
where
    P: Platform,
    C: Classifier,
    S: ImageStore,
    R: ReportRepository,
{
    pub fn new(platform: P, classifier: C, images: S, reports: R, settings: WorkflowSettings) -> Self {
        Self {
            platform,
            classifier,
            images,
            reports,
            settings,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Capture, locate and classify a photo.
    ///
    /// Ends either in `AwaitingConfirmation` (returning the result to review)
    /// or back in `Idle`.
    pub async fn start_capture(&mut self) -> Result<CaptureOutcome> {
        if !matches!(self.state, WorkflowState::Idle) {
            return Err(Error::Busy(self.state.phase().name()));
        }

        if !self.platform.request_camera_permission().await {
            log::warn!("Camera permission denied");
            self.platform.notify(&Notice::CameraPermissionRequired);
            return Err(Error::PermissionDenied(PermissionKind::Camera));
        }

        self.transition(WorkflowState::Capturing);
        let photo = match self.platform.capture_photo().await {
            Ok(photo) => photo,
            Err(e) => return Err(self.abort(e, Notice::CaptureFailed)),
        };

        self.transition(WorkflowState::LocationPending { photo: photo.clone() });
        if !self.platform.request_location_permission().await {
            return Err(self.abort(
                Error::PermissionDenied(PermissionKind::Location),
                Notice::LocationPermissionRequired,
            ));
        }
        let position = match self.platform.current_position().await {
            Ok(position) => position,
            Err(e) => return Err(self.abort(e, Notice::LocationUnavailable)),
        };

        self.transition(WorkflowState::Inferring {
            photo: photo.clone(),
            position,
        });
        let assessment = match self.classifier.classify(&photo).await {
            Ok(assessment) => assessment,
            Err(e) => return Err(self.abort(e, Notice::AnalysisFailed)),
        };

        let percent = assessment.confidence_percent();
        if percent < self.settings.min_confidence_percent {
            log::info!(
                "Rejected {} at {:.2}% (threshold {:.2}%)",
                assessment.issue_type,
                percent,
                self.settings.min_confidence_percent
            );
            self.transition(WorkflowState::Rejected {
                assessment: assessment.clone(),
            });
            self.platform.notify(&Notice::UncertainDetection);
            self.transition(WorkflowState::Idle);
            return Ok(CaptureOutcome::Rejected(assessment));
        }

        self.transition(WorkflowState::AwaitingConfirmation {
            photo,
            position,
            assessment,
        });
        match self.state.review() {
            Some(review) => Ok(CaptureOutcome::Ready(review)),
            None => Err(Error::NotAwaitingConfirmation(self.state.phase().name())),
        }
    }

    /// Persist the result awaiting confirmation: create the report, upload its
    /// photo, then attach the photo URL. A report created before a later step
    /// fails is left in place without an image.
    pub async fn confirm(&mut self) -> Result<ReportId> {
        let (photo, position, assessment) = match std::mem::take(&mut self.state) {
            WorkflowState::AwaitingConfirmation {
                photo,
                position,
                assessment,
            } => (photo, position, assessment),
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(Error::NotAwaitingConfirmation(phase.name()));
            }
        };

        self.transition(WorkflowState::Persisting { report_id: None });
        let report = NewIssueReport::pending(&assessment, Some(position), Utc::now());
        let report_id = match self.reports.create(&report).await {
            Ok(id) => id,
            Err(e) => return Err(self.abort(e, Notice::ReportFailed)),
        };

        self.transition(WorkflowState::Persisting {
            report_id: Some(report_id),
        });
        let image_url = match self.images.upload(&photo, &report_id).await {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Issue report {} left without an image", report_id);
                return Err(self.abort(e, Notice::ReportFailed));
            }
        };
        if let Err(e) = self.reports.attach_image(&report_id, &image_url).await {
            log::warn!("Issue report {} left without an image URL ({})", report_id, image_url);
            return Err(self.abort(e, Notice::ReportFailed));
        }

        log::info!("Reported issue {} as {}", report_id, assessment.issue_type);
        self.transition(WorkflowState::Done { report_id, image_url });
        self.platform.notify(&Notice::Reported);
        tokio::time::sleep(self.settings.success_dwell).await;
        self.transition(WorkflowState::Idle);

        Ok(report_id)
    }

    /// Dismiss the result awaiting confirmation without writing anything.
    pub fn decline(&mut self) -> Result<()> {
        if !matches!(self.state, WorkflowState::AwaitingConfirmation { .. }) {
            return Err(Error::NotAwaitingConfirmation(self.state.phase().name()));
        }
        log::info!("User declined to report");
        self.transition(WorkflowState::Idle);
        Ok(())
    }

    /// One full run: capture, ask the platform for confirmation, and persist.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let review = match self.start_capture().await? {
            CaptureOutcome::Ready(review) => review,
            CaptureOutcome::Rejected(assessment) => return Ok(RunOutcome::Rejected(assessment)),
        };

        if self.platform.confirm(&review).await {
            self.confirm().await.map(RunOutcome::Reported)
        } else {
            self.decline()?;
            Ok(RunOutcome::Declined)
        }
    }

    /// Replace the state. The platform only hears about actual phase changes.
    fn transition(&mut self, next: WorkflowState) {
        let phase = next.phase();
        let previous = std::mem::replace(&mut self.state, next).phase();
        if previous != phase {
            log::debug!("Workflow {} -> {}", previous, phase);
            self.platform.phase_changed(phase);
        }
    }

    /// Notify the user, drop everything captured in this run, and return to `Idle`.
    fn abort(&mut self, err: Error, notice: Notice) -> Error {
        log::error!("Workflow aborted in {}: {}", self.state.phase(), err);
        self.platform.notify(&notice);
        self.transition(WorkflowState::Idle);
        err
    }
}
