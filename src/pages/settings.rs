use serde::Serialize;
use tokio::task::JoinHandle;

use crate::diet::dto::{food_group_icons, FoodGroupIcon};
use crate::diet::{self, DietType};
use crate::profile::{self, UserProfile};
use crate::state::AppState;
use crate::storage::StorageError;
use crate::upload::ImageFile;

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub diet: DietType,
    pub diet_label: &'static str,
    pub icons: Vec<FoodGroupIcon>,
    pub profile: UserProfile,
}

/// Falls back to Vegan when no diet has been chosen yet.
pub async fn open(st: &AppState) -> Result<SettingsView, StorageError> {
    let chosen = diet::services::current(st).await?.unwrap_or(DietType::Vegan);
    Ok(SettingsView {
        diet: chosen,
        diet_label: chosen.display_name(),
        icons: food_group_icons(chosen),
        profile: profile::services::load(st).await?,
    })
}

pub async fn change_diet(st: &AppState, choice: DietType) -> Result<JoinHandle<()>, StorageError> {
    diet::services::select(st, choice).await
}

pub async fn rename(st: &AppState, name: &str) -> Result<bool, StorageError> {
    profile::services::rename(st, name).await
}

pub async fn change_avatar(st: &AppState, image: &ImageFile) -> Result<String, StorageError> {
    profile::services::set_avatar(st, image).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_vegan_label() {
        let st = AppState::fake();
        let view = open(&st).await.unwrap();
        assert_eq!(view.diet, DietType::Vegan);
        assert_eq!(view.diet_label, "Vegan");
        assert_eq!(view.icons.iter().filter(|i| i.active).count(), 1);
    }

    #[tokio::test]
    async fn change_diet_updates_label_and_icons() {
        let st = AppState::fake();
        change_diet(&st, DietType::LactoOvoVegetarian)
            .await
            .unwrap()
            .await
            .unwrap();
        rename(&st, "Jae").await.unwrap();

        let view = open(&st).await.unwrap();
        assert_eq!(view.diet_label, "Lacto Ovo Vegetarian");
        assert_eq!(view.icons.iter().filter(|i| i.active).count(), 3);
        assert_eq!(view.profile.name.as_deref(), Some("Jae"));
    }
}
