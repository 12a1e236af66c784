use serde::Serialize;
use tracing::instrument;

use crate::diet::dto::{food_group_icons, FoodGroupIcon};
use crate::diet::{self, DietType};
use crate::error::UploadError;
use crate::profile::{self, UserProfile};
use crate::state::AppState;
use crate::storage::StorageError;
use crate::upload::{self, ImageFile, UploadOutcome};

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub needs_onboarding: bool,
    pub diet: Option<DietType>,
    pub icons: Vec<FoodGroupIcon>,
    pub profile: UserProfile,
}

pub async fn open(st: &AppState) -> Result<HomeView, StorageError> {
    let chosen = diet::services::current(st).await?;
    Ok(HomeView {
        needs_onboarding: chosen.is_none(),
        diet: chosen,
        icons: chosen.map(food_group_icons).unwrap_or_default(),
        profile: profile::services::load(st).await?,
    })
}

/// Camera or gallery pick.
#[instrument(skip(st, image))]
pub async fn scan(st: &AppState, image: ImageFile) -> Result<UploadOutcome, UploadError> {
    upload::services::begin_upload(st, image).await
}
