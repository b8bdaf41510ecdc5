//! Runtime configuration read from the environment (and `.env`, if present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BUCKET_NAME, DEFAULT_DATABASE_URL, DEFAULT_INFERENCE_TIMEOUT_SECS, DEFAULT_INFERENCE_URL,
    DEFAULT_JPEG_QUALITY, DEFAULT_MIN_CONFIDENCE_PERCENT, DEFAULT_SUCCESS_DWELL_MS,
};
use crate::error::{Error, Result};
use crate::workflow::WorkflowSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub inference_url: String,
    pub inference_timeout: Duration,
    pub bucket_name: String,
    /// When set, photos are written here instead of GCS
    pub local_storage_path: Option<PathBuf>,
    pub min_confidence_percent: f64,
    pub success_dwell: Duration,
    pub jpeg_quality: u8,
    pub auto_migrate: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or empty keys take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let min_confidence_percent: f64 = parse_or(&get, "REPORTER_MIN_CONFIDENCE", DEFAULT_MIN_CONFIDENCE_PERCENT)?;
        if !(0.0..=100.0).contains(&min_confidence_percent) {
            return Err(Error::Config(format!(
                "REPORTER_MIN_CONFIDENCE must be within 0..=100, got {}",
                min_confidence_percent
            )));
        }

        let jpeg_quality: u8 = parse_or(&get, "REPORTER_JPEG_QUALITY", DEFAULT_JPEG_QUALITY)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(Error::Config(format!(
                "REPORTER_JPEG_QUALITY must be within 1..=100, got {}",
                jpeg_quality
            )));
        }

        let timeout_secs: u64 = parse_or(&get, "REPORTER_INFERENCE_TIMEOUT_SECS", DEFAULT_INFERENCE_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(Error::Config("REPORTER_INFERENCE_TIMEOUT_SECS must be positive".to_string()));
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            inference_url: get("REPORTER_INFERENCE_URL").unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
            inference_timeout: Duration::from_secs(timeout_secs),
            bucket_name: get("REPORTER_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            local_storage_path: get("LOCAL_STORAGE_PATH").map(PathBuf::from),
            min_confidence_percent,
            success_dwell: Duration::from_millis(parse_or(&get, "REPORTER_SUCCESS_DWELL_MS", DEFAULT_SUCCESS_DWELL_MS)?),
            jpeg_quality,
            auto_migrate: parse_or(&get, "REPORTER_AUTO_MIGRATE", false)?,
        })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            min_confidence_percent: self.min_confidence_percent,
            success_dwell: self.success_dwell,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.inference_url, "http://localhost:8000/upload-image/");
        assert_eq!(config.inference_timeout, Duration::from_secs(15));
        assert_eq!(config.bucket_name, "civic_reporter_issues");
        assert_eq!(config.local_storage_path, None);
        assert_eq!(config.min_confidence_percent, 60.0);
        assert_eq!(config.success_dwell, Duration::from_millis(2000));
        assert_eq!(config.jpeg_quality, 70);
        assert!(!config.auto_migrate);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("REPORTER_INFERENCE_URL", "http://10.0.0.5:8000/upload-image/"),
            ("REPORTER_MIN_CONFIDENCE", "75"),
            ("LOCAL_STORAGE_PATH", "/var/lib/reporter"),
            ("REPORTER_AUTO_MIGRATE", "true"),
            ("REPORTER_SUCCESS_DWELL_MS", "0"),
        ])
        .unwrap();

        assert_eq!(config.inference_url, "http://10.0.0.5:8000/upload-image/");
        assert_eq!(config.min_confidence_percent, 75.0);
        assert_eq!(config.local_storage_path, Some(PathBuf::from("/var/lib/reporter")));
        assert!(config.auto_migrate);
        assert_eq!(config.workflow_settings().success_dwell, Duration::ZERO);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = config_from(&[("LOCAL_STORAGE_PATH", "  "), ("REPORTER_JPEG_QUALITY", "")]).unwrap();
        assert_eq!(config.local_storage_path, None);
        assert_eq!(config.jpeg_quality, 70);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(config_from(&[("REPORTER_MIN_CONFIDENCE", "high")]), Err(Error::Config(_))));
        assert!(matches!(config_from(&[("REPORTER_MIN_CONFIDENCE", "150")]), Err(Error::Config(_))));
        assert!(matches!(config_from(&[("REPORTER_JPEG_QUALITY", "0")]), Err(Error::Config(_))));
        assert!(matches!(config_from(&[("REPORTER_INFERENCE_TIMEOUT_SECS", "0")]), Err(Error::Config(_))));
    }
}
