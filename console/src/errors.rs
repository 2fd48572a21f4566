//! Error types for the deployment console

use thiserror::Error;

/// Main error type for the deployment console
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx response from the backend
    #[error("{}", api_error_text(*status, message.as_deref()))]
    ApiError {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

fn api_error_text(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => message.to_string(),
        _ => format!("Request failed with status code {}", status),
    }
}

impl ConsoleError {
    /// Text shown in a view's error banner.
    ///
    /// Prefers the backend's `message` field, then the transport's own text,
    /// then the caller's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ConsoleError::ApiError {
            message: Some(message),
            ..
        } = self
        {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }

        let text = self.to_string();
        if text.trim().is_empty() {
            fallback.to_string()
        } else {
            text
        }
    }

    /// HTTP status of a backend rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::ApiError { status, .. } => Some(*status),
            ConsoleError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ConsoleError {
    fn from(err: url::ParseError) -> Self {
        ConsoleError::ConfigError(format!("invalid URL: {}", err))
    }
}
