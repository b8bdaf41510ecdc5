use std::fmt;

use crate::models::{Assessment, CapturedImage, GeoPosition, ReportId};

/// Where a workflow run currently is. Each state carries only the data valid in it.
#[derive(Debug, Clone, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Capturing,
    LocationPending {
        photo: CapturedImage,
    },
    Inferring {
        photo: CapturedImage,
        position: GeoPosition,
    },
    /// Classifier result below the acceptance threshold; always followed by `Idle`
    Rejected {
        assessment: Assessment,
    },
    AwaitingConfirmation {
        photo: CapturedImage,
        position: GeoPosition,
        assessment: Assessment,
    },
    /// `report_id` is set once the record has been created
    Persisting {
        report_id: Option<ReportId>,
    },
    Done {
        report_id: ReportId,
        image_url: String,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::Capturing => Phase::Capturing,
            WorkflowState::LocationPending { .. } => Phase::LocationPending,
            WorkflowState::Inferring { .. } => Phase::Inferring,
            WorkflowState::Rejected { .. } => Phase::Rejected,
            WorkflowState::AwaitingConfirmation { .. } => Phase::AwaitingConfirmation,
            WorkflowState::Persisting { .. } => Phase::Persisting,
            WorkflowState::Done { .. } => Phase::Done,
        }
    }

    /// What the user is asked to confirm, if anything.
    pub fn review(&self) -> Option<Review> {
        match self {
            WorkflowState::AwaitingConfirmation {
                position,
                assessment,
                ..
            } => Some(Review {
                issue_type: assessment.issue_type.clone(),
                confidence_percent: assessment.confidence_percent(),
                position: *position,
            }),
            _ => None,
        }
    }
}

/// Data-free tag of a [`WorkflowState`], reported to the platform on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    LocationPending,
    Inferring,
    Rejected,
    AwaitingConfirmation,
    Persisting,
    Done,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Capturing => "Capturing",
            Phase::LocationPending => "LocationPending",
            Phase::Inferring => "Inferring",
            Phase::Rejected => "Rejected",
            Phase::AwaitingConfirmation => "AwaitingConfirmation",
            Phase::Persisting => "Persisting",
            Phase::Done => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result shown to the user while awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub issue_type: String,
    pub confidence_percent: f64,
    pub position: GeoPosition,
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Issue: {}", self.issue_type)?;
        writeln!(f, "Confidence: {:.2}%", self.confidence_percent)?;
        write!(f, "Location: {}", self.position)
    }
}
