//! Terminal implementation of the workflow platform.
//!
//! The "camera" is a photo on disk, permission and confirmation prompts are
//! `[y/N]` questions on stdin, and the device position comes from the command line.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::capture;
use crate::error::{Error, Result};
use crate::models::{CapturedImage, GeoPosition};
use crate::workflow::{Notice, Phase, Platform, Review};

pub struct TerminalPlatform {
    photo_path: PathBuf,
    jpeg_quality: u8,
    position: Option<GeoPosition>,
    assume_yes: bool,
    deny_location: bool,
    stdin: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalPlatform {
    pub fn new(photo_path: PathBuf, jpeg_quality: u8, position: Option<GeoPosition>) -> Self {
        Self {
            photo_path,
            jpeg_quality,
            position,
            assume_yes: false,
            deny_location: false,
            stdin: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Answer every prompt with yes.
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Refuse location access without prompting.
    pub fn deny_location(mut self, deny_location: bool) -> Self {
        self.deny_location = deny_location;
        self
    }

    async fn ask(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", question);
        let _ = std::io::stdout().flush();

        let mut stdin = self.stdin.lock().await;
        match stdin.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(e) => {
                log::warn!("Failed to read answer: {}", e);
                false
            }
        }
    }
}

impl Platform for TerminalPlatform {
    async fn request_camera_permission(&self) -> bool {
        self.ask("Allow access to the camera (photo source)?").await
    }

    async fn capture_photo(&self) -> Result<CapturedImage> {
        capture::load_photo(&self.photo_path, self.jpeg_quality).await
    }

    async fn request_location_permission(&self) -> bool {
        if self.deny_location {
            return false;
        }
        self.ask("Allow access to this device's location?").await
    }

    async fn current_position(&self) -> Result<GeoPosition> {
        let position = self.position.ok_or_else(|| {
            Error::LocationUnavailable("no position given; pass --latitude and --longitude".to_string())
        })?;

        if !(-90.0..=90.0).contains(&position.latitude) || !(-180.0..=180.0).contains(&position.longitude) {
            return Err(Error::LocationUnavailable(format!("position out of range: {}", position)));
        }
        Ok(position)
    }

    async fn confirm(&self, review: &Review) -> bool {
        println!("{}", review);
        self.ask("Confirm Issue?").await
    }

    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            eprintln!("{}", notice);
        } else {
            println!("{}", notice);
        }
    }

    fn phase_changed(&self, phase: Phase) {
        if matches!(phase, Phase::Inferring | Phase::Persisting) {
            println!("{}...", phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(position: Option<GeoPosition>) -> TerminalPlatform {
        TerminalPlatform::new(PathBuf::from("/tmp/none.jpg"), 70, position).assume_yes(true)
    }

    #[tokio::test]
    async fn assume_yes_grants_permissions() {
        let platform = platform(None);
        assert!(platform.request_camera_permission().await);
        assert!(platform.request_location_permission().await);
    }

    #[tokio::test]
    async fn deny_location_overrides_assume_yes() {
        let platform = platform(None).deny_location(true);
        assert!(!platform.request_location_permission().await);
    }

    #[tokio::test]
    async fn missing_position_is_unavailable() {
        let err = platform(None).current_position().await.unwrap_err();
        assert!(matches!(err, Error::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn out_of_range_position_is_unavailable() {
        let bad = GeoPosition {
            latitude: 123.0,
            longitude: 10.0,
        };
        let err = platform(Some(bad)).current_position().await.unwrap_err();
        assert!(matches!(err, Error::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn given_position_is_returned() {
        let position = GeoPosition {
            latitude: 12.9716,
            longitude: 77.5946,
        };
        assert_eq!(platform(Some(position)).current_position().await.unwrap(), position);
    }
}
