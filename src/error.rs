use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRejection {
    Empty,
    TooLarge { size: u64, limit: u64 },
    NotAnImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFailure {
    /// Non-2xx status.
    Http { status: u16, reason: String },
    /// 2xx with an `error` field or `status: "error"` in the body.
    Rejected { message: String },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("an upload is already in progress")]
    Busy,

    #[error("file rejected: {0:?}")]
    FileValidation(FileRejection),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server error: {0:?}")]
    Server(ServerFailure),

    #[error("empty response from backend")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("upload cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Busy,
    Validation,
    Timeout,
    Connectivity,
    Server,
    EmptyResponse,
    Storage,
    Cancelled,
    Generic,
}

const UPLOAD_FAILED: &str = "Upload failed.";

impl UploadError {
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest reports its own deadline without the configured value
            UploadError::Timeout(Duration::ZERO)
        } else if e.is_decode() {
            UploadError::MalformedResponse(e.to_string())
        } else {
            UploadError::Network(e.to_string())
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            UploadError::Busy => ErrorCategory::Busy,
            UploadError::FileValidation(_) => ErrorCategory::Validation,
            UploadError::Network(_) => ErrorCategory::Connectivity,
            UploadError::Timeout(_) => ErrorCategory::Timeout,
            UploadError::Server(_) => ErrorCategory::Server,
            UploadError::EmptyResponse => ErrorCategory::EmptyResponse,
            UploadError::MalformedResponse(_) => ErrorCategory::Generic,
            UploadError::Storage(_) => ErrorCategory::Storage,
            UploadError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Busy => "Image analysis is already in progress. Please wait.".into(),
            UploadError::FileValidation(FileRejection::Empty) => {
                "Please select a valid image file.".into()
            }
            UploadError::FileValidation(FileRejection::TooLarge { limit, .. }) => format!(
                "File size is too large. Please select an image under {}MB.",
                limit / (1024 * 1024)
            ),
            UploadError::FileValidation(FileRejection::NotAnImage) => {
                "Please select an image file only.".into()
            }
            UploadError::Timeout(_) => format!(
                "{UPLOAD_FAILED} Request timeout. Please check your network connection."
            ),
            UploadError::Network(_) => format!(
                "{UPLOAD_FAILED} Cannot connect to server. Please check your internet connection."
            ),
            UploadError::Server(ServerFailure::Http { status, reason }) => format!(
                "{UPLOAD_FAILED} Server error: HTTP error! status: {status} - {reason}"
            ),
            UploadError::Server(ServerFailure::Rejected { .. }) => format!(
                "{UPLOAD_FAILED} Image analysis failed. Please try with a different image."
            ),
            UploadError::EmptyResponse => {
                format!("{UPLOAD_FAILED} Server returned empty response. Please try again.")
            }
            UploadError::Storage(_) => "Failed to save results.".into(),
            UploadError::Cancelled => "Upload cancelled.".into(),
            UploadError::MalformedResponse(_) => format!("{UPLOAD_FAILED} Please try again."),
        }
    }
}
