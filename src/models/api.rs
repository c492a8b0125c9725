use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response from `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Stage as reported by the analysis service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStage {
    Upload,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Response from `GET /api/status/{fileId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stage: RemoteStage,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Option<Map<String, Value>>,
}
