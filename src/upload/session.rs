use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;
use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ErrorCategory, UploadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Succeeded,
    Failed(ErrorCategory),
}

struct ActiveUpload {
    id: Uuid,
    cancel: Arc<Notify>,
    started_at: OffsetDateTime,
}

struct Inner {
    active: Option<ActiveUpload>,
    phase: UploadPhase,
}

/// Tracks the single in-flight upload. At most one ticket is live at a time.
pub struct UploadSession {
    inner: Mutex<Inner>,
}

/// Handle held by the task performing the upload.
pub struct SessionTicket {
    pub id: Uuid,
    cancel: Arc<Notify>,
}

impl SessionTicket {
    /// Resolves once `UploadSession::cancel` has been called for this ticket.
    pub async fn cancelled(&self) {
        self.cancel.notified().await
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                active: None,
                phase: UploadPhase::Idle,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn phase(&self) -> UploadPhase {
        self.lock().phase
    }

    pub fn start(&self) -> Result<SessionTicket, UploadError> {
        let mut inner = self.lock();
        if inner.active.is_some() {
            return Err(UploadError::Busy);
        }
        let id = Uuid::new_v4();
        let cancel = Arc::new(Notify::new());
        inner.active = Some(ActiveUpload {
            id,
            cancel: cancel.clone(),
            started_at: OffsetDateTime::now_utc(),
        });
        inner.phase = UploadPhase::Uploading;
        debug!(session = %id, "upload session started");
        Ok(SessionTicket { id, cancel })
    }

    /// Aborts the in-flight upload, if any. Returns whether one was active.
    pub fn cancel(&self) -> bool {
        let inner = self.lock();
        match &inner.active {
            Some(active) => {
                // notify_one keeps a permit, so a cancel that lands before the
                // uploader starts waiting is not lost
                active.cancel.notify_one();
                info!(session = %active.id, "upload cancel requested");
                true
            }
            None => false,
        }
    }

    /// Ends the session owned by `ticket`. A stale ticket is ignored.
    pub fn finish(&self, ticket: &SessionTicket, result: Result<(), ErrorCategory>) {
        let mut inner = self.lock();
        let Some(active) = inner.active.as_ref().filter(|a| a.id == ticket.id) else {
            return;
        };
        let elapsed = OffsetDateTime::now_utc() - active.started_at;
        inner.active = None;
        inner.phase = match result {
            Ok(()) => UploadPhase::Succeeded,
            Err(category) => UploadPhase::Failed(category),
        };
        debug!(session = %ticket.id, phase = ?inner.phase, elapsed_ms = elapsed.whole_milliseconds() as i64, "upload session finished");
    }

    /// Returns to `Idle` once the outcome has been shown.
    pub fn acknowledge(&self) {
        let mut inner = self.lock();
        if inner.active.is_none() {
            inner.phase = UploadPhase::Idle;
        }
    }
}
