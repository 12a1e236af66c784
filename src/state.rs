use std::sync::Arc;

use crate::analysis::{LabelSplitExtractor, ResultTransformer};
use crate::config::AppConfig;
use crate::storage::{FileStorage, StorageClient};
use crate::upload::client::{AnalysisBackend, HttpBackend};
use crate::upload::session::UploadSession;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub backend: Arc<dyn AnalysisBackend>,
    pub session: Arc<UploadSession>,
    pub transformer: ResultTransformer,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let storage = Arc::new(FileStorage::new(&config.storage_path)) as Arc<dyn StorageClient>;
        let backend = Arc::new(HttpBackend::new(&config.server_url, &config.app_url)?)
            as Arc<dyn AnalysisBackend>;

        Ok(Self::from_parts(config, storage, backend))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        Self {
            config,
            storage,
            backend,
            session: Arc::new(UploadSession::new()),
            transformer: ResultTransformer::new(LabelSplitExtractor),
        }
    }
}
