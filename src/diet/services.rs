use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::dto::DietType;
use crate::state::AppState;
use crate::storage::{keys, StorageError};
use crate::upload::client::{REGISTER_USER_TYPE_PATH, UPDATE_USER_TYPE_PATH};

/// Stored diet type. An unreadable value is treated as unset.
pub async fn current(st: &AppState) -> Result<Option<DietType>, StorageError> {
    let Some(raw) = st.storage.get_item(keys::VEG_TYPE).await? else {
        return Ok(None);
    };
    match raw.parse() {
        Ok(diet) => Ok(Some(diet)),
        Err(e) => {
            warn!(error = %e, "ignoring stored diet type");
            Ok(None)
        }
    }
}

pub async fn current_or_default(st: &AppState) -> DietType {
    match current(st).await {
        Ok(Some(diet)) => diet,
        Ok(None) => DietType::Vegan,
        Err(e) => {
            warn!(error = %e, "diet type unreadable, using Vegan");
            DietType::Vegan
        }
    }
}

/// True until a recognisable diet type has been stored.
pub async fn needs_onboarding(st: &AppState) -> Result<bool, StorageError> {
    Ok(current(st).await?.is_none())
}

/// First-run choice. Persists the diet and registers it with the app server.
#[instrument(skip(st))]
pub async fn onboard(st: &AppState, diet: DietType) -> Result<JoinHandle<()>, StorageError> {
    st.storage.set_item(keys::VEG_TYPE, diet.as_str()).await?;
    info!(diet = %diet, "diet type chosen at onboarding");
    Ok(push_in_background(st, REGISTER_USER_TYPE_PATH, diet))
}

/// Later change from the home or settings page.
#[instrument(skip(st))]
pub async fn select(st: &AppState, diet: DietType) -> Result<JoinHandle<()>, StorageError> {
    st.storage.set_item(keys::VEG_TYPE, diet.as_str()).await?;
    info!(diet = %diet, "diet type changed");
    Ok(push_in_background(st, UPDATE_USER_TYPE_PATH, diet))
}

/// Fire-and-forget: failures are only logged. The handle lets short-lived
/// callers wait for the request before exiting.
fn push_in_background(st: &AppState, path: &'static str, diet: DietType) -> JoinHandle<()> {
    let backend = st.backend.clone();
    tokio::spawn(async move {
        if let Err(e) = backend.push_diet_type(path, diet).await {
            warn!(error = %e, path, "failed to update user type");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fakes::ScriptedBackend;
    use crate::storage::MemoryStorage;
    use serde_json::Value;

    #[tokio::test]
    async fn onboarding_needed_until_diet_chosen() {
        let (st, backend) =
            AppState::fake_with(ScriptedBackend::replying(Ok(Value::Null)), MemoryStorage::new());
        assert!(needs_onboarding(&st).await.unwrap());
        assert_eq!(current_or_default(&st).await, DietType::Vegan);

        onboard(&st, DietType::PescoVegetarian).await.unwrap().await.unwrap();

        assert!(!needs_onboarding(&st).await.unwrap());
        assert_eq!(current(&st).await.unwrap(), Some(DietType::PescoVegetarian));
        let pushes = backend.pushes.lock().unwrap().clone();
        assert_eq!(
            pushes,
            vec![(REGISTER_USER_TYPE_PATH.to_string(), DietType::PescoVegetarian)]
        );
    }

    #[tokio::test]
    async fn select_persists_even_when_push_fails() {
        let (st, backend) = AppState::fake_with(
            ScriptedBackend::replying(Ok(Value::Null)).failing_pushes(),
            MemoryStorage::new(),
        );

        select(&st, DietType::OvoVegetarian).await.unwrap().await.unwrap();

        assert_eq!(
            st.storage.get_item(keys::VEG_TYPE).await.unwrap().as_deref(),
            Some("Ovo vegetarian")
        );
        assert_eq!(backend.pushes.lock().unwrap()[0].0, UPDATE_USER_TYPE_PATH);
    }

    #[tokio::test]
    async fn garbage_stored_value_reads_as_unset() {
        let st = AppState::fake();
        st.storage.set_item(keys::VEG_TYPE, "keto").await.unwrap();
        assert_eq!(current(&st).await.unwrap(), None);
        assert_eq!(current_or_default(&st).await, DietType::Vegan);
    }
}
