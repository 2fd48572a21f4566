//! Settings file management

use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Console settings, loaded from an optional JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Deployment status polling interval in seconds
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

/// Backend API settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Read the settings file, or defaults when no file is given
pub async fn load_settings(file: Option<&File>) -> Result<Settings, ConsoleError> {
    let Some(file) = file else {
        return Ok(Settings::default());
    };
    if !file.exists().await {
        return Err(ConsoleError::ConfigError(format!(
            "settings file not found: {}",
            file.path().display()
        )));
    }
    file.read_json::<Settings>().await
}
