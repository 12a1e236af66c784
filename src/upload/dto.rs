use std::path::Path;

use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::error::{ErrorCategory, FileRejection, UploadError};
use crate::pages::Page;

/// An image picked by the user, fully read into memory.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            body,
        }
    }

    /// Reads an image from disk. Files over `max_bytes` are rejected from
    /// their metadata without being read.
    pub async fn from_path(path: &Path, max_bytes: u64) -> anyhow::Result<Self> {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("stat image {}", path.display()))?
            .len();
        if size > max_bytes {
            return Err(UploadError::FileValidation(FileRejection::TooLarge {
                size,
                limit: max_bytes,
            })
            .into());
        }
        let body = tokio::fs::read(path)
            .await
            .with_context(|| format!("read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_from_ext)
            .unwrap_or("application/octet-stream");
        Ok(Self::new(file_name, content_type, Bytes::from(body)))
    }

    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            Base64::encode_string(&self.body)
        )
    }
}

fn mime_from_ext(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Stored under `tempImageData` while the analysis is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempImageData {
    pub image_url: String,
    pub status: String,
    pub timestamp: i64,
}

/// Stored under `uploadError` when an upload fails mid-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadErrorRecord {
    pub error: bool,
    pub message: String,
    #[serde(default)]
    pub category: Option<ErrorCategory>,
    pub timestamp: i64,
}

#[derive(Debug)]
pub enum UploadOutcome {
    Completed(AnalysisResult),
    Failed(UploadError),
}

impl UploadOutcome {
    pub fn navigate_to(&self) -> Page {
        match self {
            UploadOutcome::Completed(_) => Page::Result,
            UploadOutcome::Failed(_) => Page::Index,
        }
    }
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_has_mime_prefix() {
        let img = ImageFile::new("a.png", "image/png", Bytes::from_static(b"hi"));
        assert_eq!(img.to_data_url(), "data:image/png;base64,aGk=");
    }

    #[test]
    fn extension_maps_to_mime() {
        assert_eq!(mime_from_ext("JPG"), Some("image/jpeg"));
        assert_eq!(mime_from_ext("txt"), None);
    }

    #[tokio::test]
    async fn from_path_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.jpeg");
        tokio::fs::write(&path, b"\xff\xd8\xff").await.unwrap();

        let img = ImageFile::from_path(&path, 1024).await.unwrap();
        assert_eq!(img.file_name, "label.jpeg");
        assert_eq!(img.content_type, "image/jpeg");
        assert_eq!(img.size(), 3);
        assert!(img.is_image());
    }

    #[tokio::test]
    async fn from_path_rejects_oversized_file_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        tokio::fs::write(&path, vec![0u8; 17]).await.unwrap();

        let err = ImageFile::from_path(&path, 16).await.unwrap_err();
        let upload = err.downcast_ref::<UploadError>().expect("upload error");
        assert!(matches!(
            upload,
            UploadError::FileValidation(FileRejection::TooLarge { size: 17, limit: 16 })
        ));

        assert_eq!(ImageFile::from_path(&path, 17).await.unwrap().size(), 17);
    }
}
