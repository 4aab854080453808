//! API client for the OpenCircle backend
//!
//! Base-URL-rooted request helpers over the retrying [`HttpClient`], with
//! response statuses mapped into the domain error taxonomy. The session
//! rides on cookies managed by the underlying client; no per-request
//! authorization header is attached.

use std::time::Duration;

use opencircle_domain::{ApiConfig, OpenCircleError, Result};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API (e.g., "https://api.opencircle.app")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
    /// Total attempts per request (initial try + retries)
    pub max_attempts: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opencircle.app".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            max_attempts: config.max_attempts,
        }
    }
}

/// HTTP API client for the OpenCircle backend
pub struct ApiClient {
    http_client: HttpClient,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be created
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .build()?;

        Ok(Self { http_client, config })
    }

    /// Base URL this client is rooted at
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Execute a GET request and deserialize the JSON response
    ///
    /// # Errors
    /// Returns error if the request fails or the body cannot be decoded
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(Method::GET, path, Body::Empty).await?;
        Self::decode(response).await
    }

    /// Execute a GET request, treating an empty body or `null` as absent
    ///
    /// # Errors
    /// Returns error if the request fails or a present body cannot be
    /// decoded
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_optional_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self.execute(Method::GET, path, Body::Empty).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|err| OpenCircleError::Decode(err.to_string()))?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }

        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|err| OpenCircleError::Decode(format!("failed to parse response: {err}")))
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    /// Returns error if the request fails or the body cannot be decoded
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let body = serde_json::to_value(body)
            .map_err(|err| OpenCircleError::Internal(format!("failed to serialize body: {err}")))?;
        let response = self.execute(Method::POST, path, Body::Json(body)).await?;
        Self::decode(response).await
    }

    /// Execute a POST request with a form-encoded body
    ///
    /// The sign-in endpoints take form-encoded credentials, not JSON.
    ///
    /// # Errors
    /// Returns error if the request fails or the body cannot be decoded
    #[instrument(skip(self, form), fields(path = %path))]
    pub async fn post_form<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        form: &B,
    ) -> Result<R> {
        let form = serde_json::to_value(form)
            .map_err(|err| OpenCircleError::Internal(format!("failed to serialize form: {err}")))?;
        let response = self.execute(Method::POST, path, Body::Form(form)).await?;
        Self::decode(response).await
    }

    /// Execute a POST request, discarding any response body
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self), fields(path = %path))]
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.execute(Method::POST, path, Body::Empty).await?;
        Ok(())
    }

    /// Execute a POST request with a JSON body, discarding any response body
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post_json_empty<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body)
            .map_err(|err| OpenCircleError::Internal(format!("failed to serialize body: {err}")))?;
        self.execute(Method::POST, path, Body::Json(body)).await?;
        Ok(())
    }

    /// Execute a PUT request, discarding any response body
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self), fields(path = %path))]
    pub async fn put_empty(&self, path: &str) -> Result<()> {
        self.execute(Method::PUT, path, Body::Empty).await?;
        Ok(())
    }

    async fn execute(&self, method: Method, path: &str, body: Body) -> Result<Response> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%method, url = %url, "API request");

        let mut request = self.http_client.request(method, &url);
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Form(value) => request.form(&value),
        };

        let response = self.http_client.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &url, body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        // 204/205 have no body by RFC spec
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                OpenCircleError::Decode(format!(
                    "no content response ({}), but response type cannot be deserialized from an empty body",
                    status.as_u16()
                ))
            });
        }

        response
            .json()
            .await
            .map_err(|err| OpenCircleError::Decode(format!("failed to parse response: {err}")))
    }
}

enum Body {
    Empty,
    Json(serde_json::Value),
    Form(serde_json::Value),
}

fn map_status_error(status: StatusCode, url: &str, body: String) -> OpenCircleError {
    let message = if body.is_empty() {
        format!("{url} returned status {status}")
    } else {
        format!("{url} returned status {status}: {body}")
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        OpenCircleError::Rejected(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        OpenCircleError::RateLimited(message)
    } else if status.is_server_error() {
        OpenCircleError::Server(message)
    } else if status.is_client_error() {
        OpenCircleError::Client(message)
    } else {
        OpenCircleError::Network(message)
    }
}
