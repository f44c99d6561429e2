use std::time::Duration;

use futures_util::StreamExt;
use podcast_core::{endpoint_url, EndpointLayout, SourceFile, StatusReport, TaskId};
use podcast_logging::{podcast_debug, podcast_trace};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{CreateTaskResponse, StatusResponse};
use crate::{ApiError, FailureKind};

/// Form field carrying the uploaded document.
const FILE_FIELD: &str = "pdf_file";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub server: Url,
    pub endpoints: EndpointLayout,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upload requests carry the whole document and get their own budget.
    pub upload_timeout: Duration,
    pub max_artifact_bytes: u64,
    /// Server-side generation model; the server default applies when unset.
    pub model: Option<String>,
    pub auth_token: Option<String>,
}

impl ApiSettings {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            endpoints: EndpointLayout::Current,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(300),
            max_artifact_bytes: 200 * 1024 * 1024,
            model: None,
            auth_token: None,
        }
    }
}

/// The conversion service as seen by the tracker.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    /// Uploads the document and returns the id of the created task.
    async fn create_task(&self, file: &SourceFile) -> Result<TaskId, ApiError>;

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, ApiError>;

    /// Downloads a finished artifact. Safe to call repeatedly.
    async fn fetch_artifact(&self, location: &Url) -> Result<Vec<u8>, ApiError>;

    async fn check_health(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestTaskApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.settings.server, segments)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.auth_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self.authorize(request).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), detail));
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl TaskApi for ReqwestTaskApi {
    async fn create_task(&self, file: &SourceFile) -> Result<TaskId, ApiError> {
        let url = self.url(&self.settings.endpoints.create_segments())?;
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let mut form = Form::new().part(FILE_FIELD, part);
        if let Some(model) = self.settings.model.clone() {
            form = form.text("model", model);
        }

        podcast_debug!("POST {} ({} bytes)", url, file.bytes.len());
        let request = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form);
        let response = self.send(request).await?;
        let created: CreateTaskResponse = Self::read_json(response).await?;
        if created.task_id.trim().is_empty() {
            return Err(ApiError::new(FailureKind::Decode, "empty task id"));
        }
        Ok(TaskId::new(created.task_id))
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, ApiError> {
        let url = self.url(&self.settings.endpoints.status_segments(task_id))?;
        podcast_trace!("GET {}", url);
        let request = self.client.get(url).timeout(self.settings.request_timeout);
        let response = self.send(request).await?;
        let status: StatusResponse = Self::read_json(response).await?;
        Ok(status.into())
    }

    async fn fetch_artifact(&self, location: &Url) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_artifact_bytes;
        podcast_debug!("GET {}", location);
        let request = self
            .client
            .get(location.clone())
            .timeout(self.settings.upload_timeout);
        let response = self.send(request).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn check_health(&self) -> Result<(), ApiError> {
        let url = self.url(&self.settings.endpoints.health_segments())?;
        let request = self.client.get(url).timeout(self.settings.request_timeout);
        self.send(request).await.map(|_| ())
    }
}

/// Prefers the server's `{"detail": ...}` text over the bare status line.
async fn error_detail(response: reqwest::Response) -> String {
    let fallback = response.status().to_string();
    let Ok(body) = response.bytes().await else {
        return fallback;
    };
    serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or(fallback)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
