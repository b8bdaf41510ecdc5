//! Object storage for issue photos.
//!
//! Photos are written to GCS, or to a local directory when
//! `LOCAL_STORAGE_PATH` is configured for development.

use std::future::Future;
use std::path::PathBuf;

use google_cloud_storage::client::Storage;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::constants::{GCS_PUBLIC_ORIGIN, ISSUES_PREFIX};
use crate::error::{Error, LogErr, Result};
use crate::models::{CapturedImage, ReportId};

/// Characters escaped in object names when building public URLs
const OBJECT_NAME_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Anything that can store the photo belonging to a report and hand back a URL for it.
pub trait ImageStore {
    fn upload(
        &self,
        image: &CapturedImage,
        report_id: &ReportId,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Object name for a report's photo. Unique per report, so re-uploads overwrite.
pub fn object_name(report_id: &ReportId) -> String {
    format!("{}/{}.jpg", ISSUES_PREFIX, report_id)
}

/// Publicly fetchable URL of an object in a GCS bucket.
pub fn public_url(bucket_name: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        GCS_PUBLIC_ORIGIN,
        utf8_percent_encode(bucket_name, OBJECT_NAME_ESCAPE),
        utf8_percent_encode(path, OBJECT_NAME_ESCAPE)
    )
}

#[derive(Clone)]
enum Backend {
    Gcs { client: Storage, bucket_name: String },
    Local { root: PathBuf },
}

#[derive(Clone)]
pub struct ObjectStore {
    backend: Backend,
}

impl ObjectStore {
    /// GCS-backed store. Credentials come from `GOOGLE_APPLICATION_CREDENTIALS`.
    pub async fn gcs(bucket_name: impl Into<String>) -> Result<Self> {
        let client = Storage::builder()
            .build()
            .await
            .log_as("Failed to create GCS client", Error::Config)?;

        Ok(Self {
            backend: Backend::Gcs {
                client,
                bucket_name: bucket_name.into(),
            },
        })
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Local { root: root.into() },
        }
    }

    /// Write data at `path` and return its URL.
    pub async fn upload_data(&self, path: &str, data: bytes::Bytes) -> Result<String> {
        match &self.backend {
            Backend::Local { root } => {
                let full_path = root.join(path);
                if let Some(parent) = full_path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .log_as("Create local storage directory", Error::Storage)?;
                }
                tokio::fs::write(&full_path, &data)
                    .await
                    .log_as("Write local object", Error::Storage)?;

                let absolute = tokio::fs::canonicalize(&full_path)
                    .await
                    .log_as("Resolve local object path", Error::Storage)?;
                Url::from_file_path(&absolute)
                    .map(String::from)
                    .map_err(|_| Error::Storage(format!("not a file URL path: {}", absolute.display())))
            }
            Backend::Gcs { client, bucket_name } => {
                let bucket = format!("projects/_/buckets/{}", bucket_name);
                client
                    .write_object(&bucket, path, data)
                    .send_buffered()
                    .await
                    .log_as("GCS upload error", Error::Storage)?;
                Ok(public_url(bucket_name, path))
            }
        }
    }
}

impl ImageStore for ObjectStore {
    async fn upload(&self, image: &CapturedImage, report_id: &ReportId) -> Result<String> {
        let path = object_name(report_id);
        let url = self.upload_data(&path, image.bytes.clone()).await?;
        log::info!("Uploaded {} ({} bytes) for report {}", path, image.bytes.len(), report_id);
        Ok(url)
    }
}
