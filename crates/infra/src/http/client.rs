use std::time::Duration;

use opencircle_domain::OpenCircleError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

/// HTTP client with built-in retry and timeout support.
///
/// The cookie store is always enabled: the OpenCircle backend issues
/// cookie-based sessions, and every request after sign-in must carry them.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, OpenCircleError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Server errors (5xx) and transient transport failures are retried
    /// with exponential backoff until attempts run out; the last response
    /// or error is returned as-is.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, OpenCircleError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                OpenCircleError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder
                .build()
                .map_err(|err| OpenCircleError::Internal(err.to_string()))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(self.map_transport_error(&err));
                }
            }
        }

        Err(OpenCircleError::Internal(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> OpenCircleError {
        if err.is_timeout() {
            OpenCircleError::Timeout(self.timeout)
        } else {
            OpenCircleError::Network(err.to_string())
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, OpenCircleError> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client =
            builder.build().map_err(|err| OpenCircleError::Internal(err.to_string()))?;

        Ok(HttpClient {
            client,
            timeout: self.timeout,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_send_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = client.request(Method::GET, format!("{}/ping", mock_server.uri()));

        let response = client.send(request).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mock_server = MockServer::start().await;

        // First attempt fails, second succeeds
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = HttpClient::builder()
            .max_attempts(3)
            .base_backoff(Duration::from_millis(1))
            .build()
            .unwrap();
        let request = client.request(Method::GET, format!("{}/flaky", mock_server.uri()));

        let response = client.send(request).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = HttpClient::builder()
            .max_attempts(2)
            .base_backoff(Duration::from_millis(1))
            .build()
            .unwrap();
        let request = client.request(Method::GET, format!("{}/down", mock_server.uri()));

        let response = client.send(request).await.unwrap();
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_network_error() {
        // Port 9 (discard) is not listening
        let client = HttpClient::builder()
            .max_attempts(1)
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let request = client.request(Method::GET, "http://127.0.0.1:9/nope");

        let result = client.send(request).await;
        assert!(matches!(
            result,
            Err(OpenCircleError::Network(_)) | Err(OpenCircleError::Timeout(_))
        ));
    }
}
