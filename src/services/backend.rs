use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};

use crate::models::api::{StatusResponse, UploadResponse};
use crate::models::document::DocumentFile;

/// The analysis service as seen by the client.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Liveness check. `Ok` only for a 200 response.
    async fn probe(&self) -> Result<(), BackendError>;

    /// Upload a document and return the identifier of the started job.
    async fn upload(&self, document: &DocumentFile) -> Result<UploadResponse, BackendError>;

    /// Fetch the current status of a job.
    async fn status(&self, file_id: &str) -> Result<StatusResponse, BackendError>;

    /// Fetch the report artifact of a completed job.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, BackendError>;
}

/// Client for the analysis service HTTP API.
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    /// Every request made through this client is abandoned after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn probe(&self) -> Result<(), BackendError> {
        let response = self.http.get(self.url("/api/test")).send().await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(BackendError::Status(status)),
        }
    }

    async fn upload(&self, document: &DocumentFile) -> Result<UploadResponse, BackendError> {
        let part = multipart::Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(&document.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(BackendError::Decode)
    }

    async fn status(&self, file_id: &str) -> Result<StatusResponse, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/status/{}", file_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(BackendError::Decode)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/download/{}", file_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Network-layer failure talking to the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analysis service responded with {0}")]
    Status(StatusCode),

    #[error("Failed to decode analysis service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Analysis service did not answer within {0:?}")]
    TimedOut(Duration),
}
