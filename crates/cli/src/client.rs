//! Backend HTTP clients
//!
//! Two independent backends: the catalog REST API (projects, features,
//! images, strategies) and the instructions service. Each is reached through
//! a trait so the view controllers can run against any implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use testdeck_common::{
    ErrorBody, Feature, FeatureDetail, FeatureId, GenerateResponse, GeneratedInstructions,
    GeneratedStrategy, ImageAttachment, ImproveResponse, NewFeature, NewProject, Project,
    ProjectId, StrategySaved, StrategyUpdate,
};

use crate::config::{ClientConfig, HttpConfig};

/// Errors from a single backend request
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Domain(#[from] testdeck_common::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Inputs of a strategy generation request
#[derive(Debug, Clone, Copy)]
pub struct StrategyRequest<'a> {
    pub feature: FeatureId,
    pub project: ProjectId,
    pub image: &'a ImageAttachment,
    pub context: &'a str,
}

/// Catalog backend operations
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_projects(&self) -> ApiResult<Vec<Project>>;
    async fn list_features(&self, project: ProjectId) -> ApiResult<Vec<Feature>>;
    async fn add_project(&self, body: &NewProject) -> ApiResult<()>;
    async fn add_feature(&self, body: &NewFeature) -> ApiResult<()>;
    async fn feature_detail(&self, feature: FeatureId) -> ApiResult<FeatureDetail>;
    async fn replace_image(&self, feature: FeatureId, image: &ImageAttachment) -> ApiResult<()>;
    async fn save_strategy(&self, feature: FeatureId, body: &StrategyUpdate) -> ApiResult<StrategySaved>;
    async fn generate_strategy(&self, request: StrategyRequest<'_>) -> ApiResult<GeneratedStrategy>;

    /// Absolute URL of a stored image path
    fn media_url(&self, path: &str) -> String;
}

/// Instructions backend operations
#[async_trait]
pub trait InstructionsApi: Send + Sync {
    async fn generate(&self, context: &str, images: &[ImageAttachment]) -> ApiResult<GeneratedInstructions>;
    async fn improve(
        &self,
        previous: &GeneratedInstructions,
        improvement_context: &str,
    ) -> ApiResult<GeneratedInstructions>;
}

fn build_http(config: &HttpConfig) -> ApiResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Join a base URL and a relative path with exactly one slash at the seam.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn image_part(image: &ImageAttachment) -> ApiResult<Part> {
    Ok(Part::bytes(image.bytes.to_vec())
        .file_name(image.file_name.clone())
        .mime_str(&image.mime)?)
}

async fn check_status(endpoint: &str, response: reqwest::Response) -> ApiResult<bytes::Bytes> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: ErrorBody::message_from(&body),
        });
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> ApiResult<T> {
    let body = check_status(endpoint, response).await?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Client for the catalog REST API
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    api_base: String,
    media_base: String,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self {
            http: build_http(&config.http)?,
            api_base: config.catalog.api_base_url.clone(),
            media_base: config.catalog.media_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.api_base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        read_json(path, response).await
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> ApiResult<bytes::Bytes> {
        let url = self.url(path);
        debug!(%url, "POST json");
        let response = self.http.post(&url).json(body).send().await?;
        check_status(path, response).await
    }

    async fn post_form(&self, path: &str, form: Form) -> ApiResult<reqwest::Response> {
        let url = self.url(path);
        debug!(%url, "POST multipart");
        Ok(self.http.post(&url).multipart(form).send().await?)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get_json("get-projects/").await
    }

    async fn list_features(&self, project: ProjectId) -> ApiResult<Vec<Feature>> {
        self.get_json(&format!("get-project-features/{}/", project)).await
    }

    async fn add_project(&self, body: &NewProject) -> ApiResult<()> {
        self.post_json("add-project/", body).await?;
        Ok(())
    }

    async fn add_feature(&self, body: &NewFeature) -> ApiResult<()> {
        let created = self.post_json("add-feature/", body).await?;
        debug!(body = %String::from_utf8_lossy(&created), "feature created");
        Ok(())
    }

    async fn feature_detail(&self, feature: FeatureId) -> ApiResult<FeatureDetail> {
        self.get_json(&format!("get-feature-details/{}/", feature)).await
    }

    async fn replace_image(&self, feature: FeatureId, image: &ImageAttachment) -> ApiResult<()> {
        let path = format!("add-or-replace-image/{}/", feature);
        let form = Form::new().part("image_file", image_part(image)?);
        let response = self.post_form(&path, form).await?;
        check_status(&path, response).await?;
        Ok(())
    }

    async fn save_strategy(&self, feature: FeatureId, body: &StrategyUpdate) -> ApiResult<StrategySaved> {
        let path = format!("add-or-replace-strategy/{}/", feature);
        let raw = self.post_json(&path, body).await?;
        serde_json::from_slice(&raw).map_err(|source| ApiError::Decode { endpoint: path, source })
    }

    async fn generate_strategy(&self, request: StrategyRequest<'_>) -> ApiResult<GeneratedStrategy> {
        let path = "multimodal-llm/";
        let form = Form::new()
            .part("image_file", image_part(request.image)?)
            .text("text_input", request.context.to_string())
            .text("feature_id", request.feature.to_string())
            .text("project_id", request.project.to_string());
        let response = self.post_form(path, form).await?;
        read_json(path, response).await
    }

    fn media_url(&self, path: &str) -> String {
        join_url(&self.media_base, path)
    }
}

/// Client for the instructions service
#[derive(Debug, Clone)]
pub struct InstructionsClient {
    http: reqwest::Client,
    base: String,
}

impl InstructionsClient {
    /// Create a new instructions client
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self {
            http: build_http(&config.http)?,
            base: config.instructions.base_url.clone(),
        })
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        let url = join_url(&self.base, path);
        debug!(%url, "POST multipart");
        let response = self.http.post(&url).multipart(form).send().await?;
        read_json(path, response).await
    }
}

#[async_trait]
impl InstructionsApi for InstructionsClient {
    async fn generate(&self, context: &str, images: &[ImageAttachment]) -> ApiResult<GeneratedInstructions> {
        let mut form = Form::new().text("context", context.to_string());
        for (index, image) in images.iter().enumerate() {
            form = form.part(format!("image{}", index), image_part(image)?);
        }

        let envelope: GenerateResponse = self.post_form("generate_instructions", form).await?;
        Ok(envelope.decode()?)
    }

    async fn improve(
        &self,
        previous: &GeneratedInstructions,
        improvement_context: &str,
    ) -> ApiResult<GeneratedInstructions> {
        let form = Form::new()
            .text("previousInstructions", previous.to_form_value()?)
            .text("improvementContext", improvement_context.to_string());

        let envelope: ImproveResponse = self.post_form("improve_instructions", form).await?;
        Ok(envelope.decode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://127.0.0.1:8000/mainPage/api/", "get-projects/"),
            "http://127.0.0.1:8000/mainPage/api/get-projects/"
        );
        assert_eq!(
            join_url("http://127.0.0.1:8000", "/media/features/login.png"),
            "http://127.0.0.1:8000/media/features/login.png"
        );
        assert_eq!(join_url("http://h:5000", "generate_instructions"), "http://h:5000/generate_instructions");
    }
}
