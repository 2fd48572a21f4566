//! Application configuration options

use std::time::Duration;

use url::Url;

use crate::errors::ConsoleError;
use crate::logs::LogOptions;
use crate::storage::settings::Settings;
use crate::workers::poller;

/// Production backend, used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://my-backend-1xnh.onrender.com";

/// Build-time and runtime override for the backend URL
pub const BASE_URL_ENV: &str = "BC_DEPLOYER_API_BASE_URL";

/// Main application options, built once at start-up
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Backend API base URL
    pub backend_base_url: Url,

    /// Status poller options
    pub poller: poller::Options,

    /// Logging options
    pub log: LogOptions,
}

impl AppOptions {
    /// Merge command-line values over the settings file
    pub fn from_settings(
        settings: &Settings,
        base_url_flag: Option<&str>,
    ) -> Result<Self, ConsoleError> {
        let backend_base_url = resolve_base_url(
            base_url_flag,
            settings.backend.base_url.as_deref(),
            option_env!("BC_DEPLOYER_API_BASE_URL"),
        )?;

        let mut poller = poller::Options::default();
        if let Some(secs) = settings.poll_interval_secs.filter(|s| *s > 0) {
            poller.interval = Duration::from_secs(secs);
        }

        Ok(Self {
            backend_base_url,
            poller,
            log: LogOptions {
                log_level: settings.log_level,
                json_format: settings.json_logs,
            },
        })
    }
}

/// First non-blank candidate wins: flag/env, settings file, build-time value,
/// then the production default.
pub fn resolve_base_url(
    flag: Option<&str>,
    settings: Option<&str>,
    build_time: Option<&str>,
) -> Result<Url, ConsoleError> {
    let chosen = [flag, settings, build_time]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty());

    match chosen {
        Some(raw) => Url::parse(raw)
            .map_err(|e| ConsoleError::ConfigError(format!("invalid backend URL {:?}: {}", raw, e))),
        None => Ok(Url::parse(DEFAULT_BASE_URL)?),
    }
}
