use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::dto::{now_millis, ImageFile, TempImageData, UploadErrorRecord, UploadOutcome};
use super::session::SessionTicket;
use crate::analysis::AnalysisResult;
use crate::diet::{self, DietType};
use crate::error::{FileRejection, ServerFailure, UploadError};
use crate::state::AppState;
use crate::storage::{self, keys};

/// Rejects a file before any network work is done.
pub fn validate(image: &ImageFile, max_bytes: u64) -> Result<(), UploadError> {
    if image.body.is_empty() {
        return Err(UploadError::FileValidation(FileRejection::Empty));
    }
    if image.size() > max_bytes {
        return Err(UploadError::FileValidation(FileRejection::TooLarge {
            size: image.size(),
            limit: max_bytes,
        }));
    }
    if !image.is_image() {
        return Err(UploadError::FileValidation(FileRejection::NotAnImage));
    }
    Ok(())
}

/// Starts an analysis of `image`.
///
/// `Err` means the upload never started (busy or invalid file) and nothing
/// was changed. Once started, every failure is reported as
/// `UploadOutcome::Failed` after the session has been cleared and the error
/// record written.
#[instrument(skip(st, image), fields(file = %image.file_name, bytes = image.body.len()))]
pub async fn begin_upload(st: &AppState, image: ImageFile) -> Result<UploadOutcome, UploadError> {
    if st.session.is_active() {
        warn!("upload already in progress");
        return Err(UploadError::Busy);
    }
    if let Err(e) = validate(&image, st.config.max_image_bytes) {
        warn!(error = %e, content_type = %image.content_type, "file rejected");
        return Err(e);
    }
    let ticket = st.session.start()?;

    let image_url = image.to_data_url();
    stash_temp_image(st, &image_url).await;
    let diet = diet::services::current_or_default(st).await;

    match analyse(st, &ticket, &image, diet, image_url).await {
        Ok(result) => {
            st.session.finish(&ticket, Ok(()));
            info!(
                danger = result.danger.len(),
                caution = result.caution.len(),
                safe = result.safe.len(),
                "analysis stored"
            );
            Ok(UploadOutcome::Completed(result))
        }
        Err(e) => {
            error!(error = %e, category = ?e.category(), "upload failed");
            record_failure(st, &e).await;
            st.session.finish(&ticket, Err(e.category()));
            Ok(UploadOutcome::Failed(e))
        }
    }
}

/// Aborts the in-flight upload. Returns whether one was running.
pub fn cancel(st: &AppState) -> bool {
    st.session.cancel()
}

async fn analyse(
    st: &AppState,
    ticket: &SessionTicket,
    image: &ImageFile,
    diet: DietType,
    image_url: String,
) -> Result<AnalysisResult, UploadError> {
    let limit = st.config.request_timeout;
    let reply = tokio::select! {
        res = tokio::time::timeout(limit, st.backend.check_label(image, diet)) => match res {
            Ok(reply) => reply,
            Err(_) => Err(UploadError::Timeout(limit)),
        },
        _ = ticket.cancelled() => Err(UploadError::Cancelled),
    };
    let body = reply?;
    check_application_error(&body)?;

    let mut result = st.transformer.transform(&body);
    result.image_url = image_url;

    // written before the caller navigates so the result page always finds it
    storage::set_json(st.storage.as_ref(), keys::RESULT_DATA, &result).await?;
    if let Err(e) = st.storage.remove_item(keys::TEMP_IMAGE_DATA).await {
        warn!(error = %e, "could not clear temp image");
    }
    Ok(result)
}

/// A 200 can still carry a failure in the body.
fn check_application_error(body: &Value) -> Result<(), UploadError> {
    let Some(obj) = body.as_object() else {
        return Err(UploadError::MalformedResponse(format!(
            "expected a json object, got {body}"
        )));
    };

    let error_flag = obj.get("error").is_some_and(truthy);
    let status_error = obj.get("status").and_then(Value::as_str) == Some("error");
    if error_flag || status_error {
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| obj.get("error").and_then(Value::as_str))
            .unwrap_or("Backend processing failed")
            .to_string();
        return Err(UploadError::Server(ServerFailure::Rejected { message }));
    }

    if obj.is_empty() {
        return Err(UploadError::EmptyResponse);
    }
    Ok(())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

async fn stash_temp_image(st: &AppState, image_url: &str) {
    let temp = TempImageData {
        image_url: image_url.to_string(),
        status: "processing".into(),
        timestamp: now_millis(),
    };
    if let Err(e) = storage::set_json(st.storage.as_ref(), keys::TEMP_IMAGE_DATA, &temp).await {
        warn!(error = %e, "could not store temp image");
    }
    for key in [keys::UPLOAD_ERROR, keys::RESULT_DATA] {
        if let Err(e) = st.storage.remove_item(key).await {
            warn!(error = %e, key, "could not clear previous scan record");
        }
    }
}

async fn record_failure(st: &AppState, err: &UploadError) {
    let record = UploadErrorRecord {
        error: true,
        message: err.user_message(),
        category: Some(err.category()),
        timestamp: now_millis(),
    };
    // drop the temp image first so a full store has room for the error record
    if let Err(e) = st.storage.remove_item(keys::TEMP_IMAGE_DATA).await {
        warn!(error = %e, "could not clear temp image");
    }
    if let Err(e) = storage::set_json(st.storage.as_ref(), keys::UPLOAD_ERROR, &record).await {
        warn!(error = %e, "could not store upload error");
    }
}
