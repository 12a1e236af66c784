use serde::Serialize;
use tracing::{info, instrument};

use crate::state::AppState;
use crate::storage::{keys, StorageError};
use crate::upload::dto::ImageFile;

/// Display-only profile shown on the home and settings pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: Option<String>,
    /// Avatar as a data url.
    pub avatar: Option<String>,
}

pub async fn load(st: &AppState) -> Result<UserProfile, StorageError> {
    Ok(UserProfile {
        name: st.storage.get_item(keys::USER_NAME).await?,
        avatar: st.storage.get_item(keys::PROFILE_IMAGE).await?,
    })
}

/// Saves the trimmed name. Blank input keeps the current name and
/// returns `false`.
#[instrument(skip(st))]
pub async fn rename(st: &AppState, name: &str) -> Result<bool, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(false);
    }
    st.storage.set_item(keys::USER_NAME, name).await?;
    info!(name, "profile name saved");
    Ok(true)
}

#[instrument(skip(st, image), fields(file = %image.file_name))]
pub async fn set_avatar(st: &AppState, image: &ImageFile) -> Result<String, StorageError> {
    let data_url = image.to_data_url();
    st.storage.set_item(keys::PROFILE_IMAGE, &data_url).await?;
    info!(bytes = image.body.len(), "profile image saved");
    Ok(data_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fakes::ScriptedBackend;
    use crate::storage::MemoryStorage;
    use bytes::Bytes;
    use serde_json::Value;

    #[tokio::test]
    async fn rename_trims_and_ignores_blank() {
        let st = AppState::fake();
        assert!(rename(&st, "  Mina  ").await.unwrap());
        assert!(!rename(&st, "   ").await.unwrap());
        assert_eq!(load(&st).await.unwrap().name.as_deref(), Some("Mina"));
    }

    #[tokio::test]
    async fn avatar_is_stored_as_data_url() {
        let st = AppState::fake();
        let img = ImageFile::new("me.png", "image/png", Bytes::from_static(b"hi"));
        let url = set_avatar(&st, &img).await.unwrap();
        assert_eq!(url, "data:image/png;base64,aGk=");
        assert_eq!(load(&st).await.unwrap().avatar, Some(url));
    }

    #[tokio::test]
    async fn avatar_write_surfaces_quota_error() {
        let (st, _) = AppState::fake_with(
            ScriptedBackend::replying(Ok(Value::Null)),
            MemoryStorage::with_quota(16),
        );
        let img = ImageFile::new("big.png", "image/png", Bytes::from(vec![0u8; 64]));
        assert!(matches!(
            set_avatar(&st, &img).await,
            Err(StorageError::QuotaExceeded { .. })
        ));
    }
}
