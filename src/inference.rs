//! Client for the remote issue classifier.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::constants::{INFERENCE_FIELD_NAME, INFERENCE_FILE_NAME};
use crate::error::{Error, LogErr, Result};
use crate::models::{Assessment, CapturedImage};

/// Anything that can turn a captured photo into an [`Assessment`].
pub trait Classifier {
    fn classify(&self, image: &CapturedImage) -> impl Future<Output = Result<Assessment>> + Send;
}

/// Body returned by the classifier. Undecodable uploads come back as
/// `{"error": "..."}` with a success status.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Ok(Assessment),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// HTTP client for the classification endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    endpoint: Url,
    http: Client,
}

impl InferenceClient {
    /// Create a client posting to `endpoint`, failing any request that takes longer than `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).log_as("Invalid inference URL", Error::Config)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .log_as("Build inference HTTP client", Error::Config)?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Probes the service root.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self
            .endpoint
            .join("/")
            .log_as("Resolve inference health URL", Error::Config)?;
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| Error::Service(format!("malformed health payload: {e}")))
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(unexpected_status(status, &body))
    }
}

impl Classifier for InferenceClient {
    async fn classify(&self, image: &CapturedImage) -> Result<Assessment> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(INFERENCE_FILE_NAME)
            .mime_str(image.content_type())
            .map_err(|e| Error::Service(format!("invalid image content type: {e}")))?;
        let form = Form::new().part(INFERENCE_FIELD_NAME, part);

        log::debug!(
            "Sending {} bytes from {} to {}",
            image.bytes.len(),
            image.uri,
            self.endpoint
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_status(response).await?;
        let body = response.text().await.map_err(transport_error)?;

        let assessment = parse_assessment(&body)?;
        log::info!(
            "Classified {} as {} ({:.3})",
            image.uri,
            assessment.issue_type,
            assessment.confidence
        );
        Ok(assessment)
    }
}

fn parse_assessment(body: &str) -> Result<Assessment> {
    let parsed: ClassifyResponse = serde_json::from_str(body)
        .map_err(|e| Error::Service(format!("malformed classifier payload: {e}")))?;

    match parsed {
        ClassifyResponse::Ok(assessment) => {
            if !assessment.confidence.is_finite() || !(0.0..=1.0).contains(&assessment.confidence) {
                return Err(Error::Service(format!(
                    "confidence out of range: {}",
                    assessment.confidence
                )));
            }
            Ok(assessment)
        }
        ClassifyResponse::Failed { error } => Err(Error::Service(format!("classifier rejected image: {error}"))),
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_decode() {
        return Error::Service(format!("unreadable classifier response: {err}"));
    }
    if err.is_timeout() {
        return Error::Network(format!("classifier timed out: {err}"));
    }
    Error::Network(err.to_string())
}

fn unexpected_status(status: StatusCode, body: &str) -> Error {
    Error::Service(format!("unexpected status {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn photo() -> CapturedImage {
        CapturedImage::new("file:///tmp/issue.jpg", b"jpeg-bytes".to_vec())
    }

    async fn client_for(server: &MockServer, timeout: Duration) -> InferenceClient {
        InferenceClient::new(&format!("{}/upload-image/", server.uri()), timeout).unwrap()
    }

    #[tokio::test]
    async fn classify_posts_multipart_and_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-image/"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .and(body_string_contains("name=\"file\"; filename=\"issue.jpg\""))
            .and(body_string_contains("image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issue_type": "pothole",
                "confidence": 0.82
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5)).await;
        let assessment = client.classify(&photo()).await.unwrap();

        assert_eq!(assessment.issue_type, "pothole");
        assert_eq!(assessment.confidence, 0.82);
    }

    #[tokio::test]
    async fn non_success_status_is_a_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5)).await;
        let err = client.classify(&photo()).await.unwrap_err();

        assert!(matches!(err, Error::Service(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn error_body_is_a_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Invalid image"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5)).await;
        let err = client.classify(&photo()).await.unwrap_err();

        assert!(matches!(err, Error::Service(ref msg) if msg.contains("Invalid image")));
    }

    #[tokio::test]
    async fn slow_classifier_times_out_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"issue_type": "pothole", "confidence": 0.9}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(200)).await;
        let err = client.classify(&photo()).await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let client = InferenceClient::new("http://127.0.0.1:9/upload-image/", Duration::from_secs(2)).unwrap();
        let err = client.classify(&photo()).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn health_hits_service_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "AI service running"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5)).await;
        let health = client.health().await.unwrap();

        assert_eq!(health.status, "AI service running");
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let err = parse_assessment(r#"{"issue_type":"pothole","confidence":1.7}"#).unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = parse_assessment(r#"{"label":"pothole"}"#).unwrap_err();
        assert!(matches!(err, Error::Service(ref msg) if msg.contains("malformed")));
    }
}
