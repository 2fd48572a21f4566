//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

/// Process-wide state, built once from the options
pub struct AppState {
    /// Options the console was started with
    pub options: AppOptions,

    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,
}

impl AppState {
    /// Initialize application state
    pub fn init(options: AppOptions) -> Result<Self, ConsoleError> {
        info!("Using backend {}", options.backend_base_url);
        let http_client = Arc::new(HttpClient::new(&options.backend_base_url)?);

        Ok(Self {
            options,
            http_client,
        })
    }
}
