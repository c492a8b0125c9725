use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the analysis service (e.g., "http://localhost:8000").
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Seconds between liveness probes while no report is displayed.
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,

    /// Milliseconds between job status requests.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Seconds before a single request to the analysis service is abandoned.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest document accepted for upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Drop status responses older than the last applied one.
    /// Off by default: the most recently *completed* response wins.
    #[serde(default)]
    pub discard_stale_polls: bool,

    /// Fail a job that stays in processing longer than this. Unset means
    /// the client waits indefinitely.
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,

    /// Directory the report artifact is written into.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_health_interval_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            health_interval_secs: default_health_interval_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            discard_stale_polls: false,
            job_timeout_secs: None,
            download_dir: default_download_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("AUDIT_").from_env()
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}
