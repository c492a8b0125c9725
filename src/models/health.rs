use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Liveness of the analysis service as last observed by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl ServiceHealth {
    pub(crate) fn record(&mut self, status: HealthStatus, message: Option<String>) {
        self.status = status;
        self.message = message;
        self.last_checked_at = Some(Utc::now());
    }
}
