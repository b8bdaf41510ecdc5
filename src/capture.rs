//! Photo capture from disk: decode whatever the source format is and
//! re-encode as JPEG at the configured quality.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use url::Url;

use crate::error::{Error, LogErr, Result};
use crate::models::CapturedImage;

/// Read the photo at `path` and return it as a JPEG capture.
pub async fn load_photo(path: &Path, quality: u8) -> Result<CapturedImage> {
    let absolute = tokio::fs::canonicalize(path)
        .await
        .log_as("Photo not found", Error::Camera)?;
    let data = tokio::fs::read(&absolute)
        .await
        .log_as("Read photo error", Error::Camera)?;

    let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&data, quality))
        .await
        .log_as("Photo encoder task failed", Error::Camera)??;

    let uri = Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| absolute.display().to_string());

    log::info!("Captured {} ({} bytes JPEG)", uri, jpeg.len());
    Ok(CapturedImage::new(uri, jpeg))
}

fn encode_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .log_as("Photo format error", Error::Camera)?
        .decode()
        .log_as("Photo decode error", Error::Camera)?;

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .log_as("Photo encode error", Error::Camera)?;

    Ok(output)
}
