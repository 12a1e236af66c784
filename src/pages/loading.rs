use tracing::warn;

use crate::state::AppState;
use crate::storage::{self, keys, StorageError};
use crate::upload::dto::{TempImageData, UploadErrorRecord};

#[derive(Debug, PartialEq, Eq)]
pub enum LoadingStatus {
    /// Still running; carries the preview image when one was stashed.
    Pending { image_url: Option<String> },
    Ready,
    Failed { message: String },
}

/// What the loading page shows on each poll. A failure is reported once:
/// the error record is cleared when it is read.
pub async fn poll(st: &AppState) -> Result<LoadingStatus, StorageError> {
    if st.storage.get_item(keys::RESULT_DATA).await?.is_some() {
        return Ok(LoadingStatus::Ready);
    }

    if let Some(raw) = st.storage.get_item(keys::UPLOAD_ERROR).await? {
        st.storage.remove_item(keys::UPLOAD_ERROR).await?;
        let message = match serde_json::from_str::<UploadErrorRecord>(&raw) {
            Ok(record) => record.message,
            Err(e) => {
                warn!(error = %e, "unreadable upload error record");
                "Upload failed. Please try again.".to_string()
            }
        };
        return Ok(LoadingStatus::Failed { message });
    }

    let temp = storage::get_json::<TempImageData>(st.storage.as_ref(), keys::TEMP_IMAGE_DATA)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "unreadable temp image");
            None
        });
    Ok(LoadingStatus::Pending {
        image_url: temp.map(|t| t.image_url),
    })
}
