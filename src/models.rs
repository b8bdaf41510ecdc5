//! Shared data models used across modules

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::REPORT_SOURCE;

/// A photo taken for the current workflow run.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Local URI the photo was captured from
    pub uri: String,
    /// JPEG-encoded bytes
    pub bytes: Bytes,
}

impl CapturedImage {
    pub fn new(uri: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            uri: uri.into(),
            bytes: bytes.into(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Device position read once per workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Classification returned by the inference endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assessment {
    pub issue_type: String,
    /// In `[0, 1]`
    pub confidence: f64,
}

impl Assessment {
    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

/// Report lifecycle status. Reports are always created as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
        }
    }
}

/// Identity assigned by the document store when a report is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub i64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An issue report as written on confirmation, before an image is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIssueReport {
    pub issue_type: String,
    /// Percent, `[0, 100]`
    pub confidence: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ReportStatus,
    pub source: &'static str,
    /// ISO-8601 device clock at confirmation time
    pub device_time: String,
}

impl NewIssueReport {
    pub fn pending(assessment: &Assessment, position: Option<GeoPosition>, now: DateTime<Utc>) -> Self {
        Self {
            issue_type: assessment.issue_type.clone(),
            confidence: assessment.confidence_percent(),
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
            status: ReportStatus::Pending,
            source: REPORT_SOURCE,
            device_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pending_report_carries_percent_and_coordinates() {
        let assessment = Assessment {
            issue_type: "pothole".to_string(),
            confidence: 0.82,
        };
        let position = GeoPosition {
            latitude: 12.9716,
            longitude: 77.5946,
        };
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();

        let report = NewIssueReport::pending(&assessment, Some(position), now);

        assert_eq!(report.issue_type, "pothole");
        assert_eq!(report.confidence, 0.82 * 100.0);
        assert_eq!(report.latitude, Some(12.9716));
        assert_eq!(report.longitude, Some(77.5946));
        assert_eq!(report.status.as_str(), "Pending");
        assert_eq!(report.source, "mobile_app");
        assert_eq!(report.device_time, "2025-03-01T08:30:00.000Z");
    }

    #[test]
    fn position_displays_five_decimals() {
        let position = GeoPosition {
            latitude: 12.9716,
            longitude: 77.5946,
        };
        assert_eq!(position.to_string(), "12.97160, 77.59460");
    }
}
