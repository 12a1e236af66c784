use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::debug;

use super::dto::ImageFile;
use crate::diet::DietType;
use crate::error::{ServerFailure, UploadError};

pub const USER_TYPE_HEADER: &str = "x-user-type";
pub const CHECK_PATH: &str = "/Check_Vegan";
pub const UPDATE_USER_TYPE_PATH: &str = "/api/update-user-type";
pub const REGISTER_USER_TYPE_PATH: &str = "/api/register-user-type";

/// Remote label analysis service plus the app endpoints that track the
/// user's diet type.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Posts the image and returns the decoded JSON body. HTTP status and
    /// empty or undecodable bodies are reported here; application-level
    /// error fields are left to the caller.
    async fn check_label(&self, image: &ImageFile, diet: DietType) -> Result<Value, UploadError>;

    async fn push_diet_type(&self, path: &str, diet: DietType) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    server_url: String,
    app_url: String,
}

impl HttpBackend {
    pub fn new(server_url: &str, app_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("greenscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn check_label(&self, image: &ImageFile, diet: DietType) -> Result<Value, UploadError> {
        let part = Part::bytes(image.body.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(UploadError::from_transport)?;
        let form = Form::new().part("file", part);

        let url = format!("{}{}", self.server_url, CHECK_PATH);
        debug!(%url, diet = %diet, bytes = image.body.len(), "posting label image");

        let res = self
            .client
            .post(&url)
            .header(USER_TYPE_HEADER, diet.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::from_transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(UploadError::Server(ServerFailure::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }));
        }

        let body = res.text().await.map_err(UploadError::from_transport)?;
        if body.trim().is_empty() {
            return Err(UploadError::EmptyResponse);
        }
        serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse(e.to_string()))
    }

    async fn push_diet_type(&self, path: &str, diet: DietType) -> anyhow::Result<()> {
        let url = format!("{}{}", self.app_url, path);
        self.client
            .post(&url)
            .header(USER_TYPE_HEADER, diet.as_str())
            .json(&json!({ "type": diet }))
            .send()
            .await?
            .error_for_status()?;
        debug!(%url, diet = %diet, "diet type pushed");
        Ok(())
    }
}
