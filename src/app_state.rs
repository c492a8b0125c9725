use std::sync::Arc;

use crate::config::ClientConfig;
use crate::services::backend::{AnalysisBackend, BackendError, HttpBackend};

/// Shared client state handed to each session.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClientConfig>,
    pub backend: Arc<dyn AnalysisBackend>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Result<Self, BackendError> {
        let backend = HttpBackend::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    pub fn with_backend(config: ClientConfig, backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }
}
