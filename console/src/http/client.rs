//! HTTP client implementation

use reqwest::{multipart::Form, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use openapi_client::models::ErrorBody;

use crate::errors::ConsoleError;

/// HTTP client bound to the backend base URL.
///
/// A plain pass-through: no retries, no timeout, no auth headers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &Url) -> Result<Self, ConsoleError> {
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::ConfigError(format!(
                "backend URL cannot be used as a base: {}",
                base_url
            )));
        }
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, ConsoleError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ConsoleError::ConfigError(format!("backend URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("GET {}", url);

        let response = check("GET", self.client.get(url)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("POST {}", url);

        let response = check("POST", self.client.post(url).json(body)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request with a multipart form body
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        form: Form,
    ) -> Result<T, ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("POST {} (multipart)", url);

        let response = check("POST", self.client.post(url).multipart(form)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("PUT {}", url);

        let response = check("PUT", self.client.put(url).json(body)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PATCH request, discarding the response body
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("PATCH {}", url);

        let response = check("PATCH", self.client.patch(url).json(body)).await?;
        // body may be empty or arbitrary JSON
        let _ = response.bytes().await?;
        Ok(())
    }

    /// Make a DELETE request, discarding the response body
    pub async fn delete(&self, segments: &[&str]) -> Result<(), ConsoleError> {
        let url = self.url_for(segments)?;
        debug!("DELETE {}", url);

        let response = check("DELETE", self.client.delete(url)).await?;
        let _ = response.bytes().await?;
        Ok(())
    }
}

/// Send the request and turn non-2xx responses into [`ConsoleError::ApiError`]
async fn check(method: &str, request: RequestBuilder) -> Result<Response, ConsoleError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("HTTP {} failed: {} - {}", method, status, body);
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        return Err(ConsoleError::ApiError {
            status: status.as_u16(),
            message,
            body,
        });
    }

    Ok(response)
}
