use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_STORAGE_PATH: &str = ".greenscan/storage.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base of the analysis server (`/Check_Vegan` lives here).
    pub server_url: String,
    /// Base of the app server that receives diet type updates.
    pub app_url: String,
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
    pub max_image_bytes: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_url = std::env::var("GREENSCAN_SERVER_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.into());
        reqwest::Url::parse(&server_url).context("GREENSCAN_SERVER_URL is not a valid url")?;

        let app_url = std::env::var("GREENSCAN_APP_URL").unwrap_or_else(|_| server_url.clone());
        reqwest::Url::parse(&app_url).context("GREENSCAN_APP_URL is not a valid url")?;

        let storage_path = std::env::var("GREENSCAN_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH));

        let timeout_secs = std::env::var("GREENSCAN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let max_image_bytes = std::env::var("GREENSCAN_MAX_IMAGE_BYTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_IMAGE_BYTES);

        Ok(Self {
            server_url: trim_base(server_url),
            app_url: trim_base(app_url),
            storage_path,
            request_timeout: Duration::from_secs(timeout_secs),
            max_image_bytes,
        })
    }

    /// Defaults without touching the environment.
    pub fn local(storage_path: PathBuf) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            app_url: DEFAULT_SERVER_URL.into(),
            storage_path,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
