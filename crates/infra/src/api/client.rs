//! Authenticated JSON client for the lead server
//!
//! Wraps [`HttpClient`] with bearer authentication, status classification
//! and body decoding. A 401 invalidates the cached token and the request is
//! replayed exactly once with a fresh one.

use std::sync::Arc;
use std::time::Duration;

use leadflow_domain::ApiConfig;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::{AccessTokenProvider, PasswordTokenProvider, StaticTokenProvider};
use super::errors::ApiError;
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the lead server (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Timeout for a single HTTP attempt
    pub timeout: Duration,
    /// Attempts for idempotent requests
    pub max_attempts: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        ApiClientConfig::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        }
    }
}

/// API client for the lead server
pub struct ApiClient {
    http_client: HttpClient,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HttpClient cannot be created
    pub fn new(
        config: ApiClientConfig,
        auth: Option<Arc<dyn AccessTokenProvider>>,
    ) -> Result<Self, ApiError> {
        let http_client = Self::http_client_for(&config)?;
        Ok(Self { http_client, auth, config })
    }

    /// Build a client from application configuration.
    ///
    /// A configured token wins over email/password; with neither, requests
    /// are sent unauthenticated.
    pub fn from_config(api: &ApiConfig) -> Result<Self, ApiError> {
        let config = ApiClientConfig::from(api);
        let http_client = Self::http_client_for(&config)?;

        let auth: Option<Arc<dyn AccessTokenProvider>> = match (&api.token, &api.email, &api.password)
        {
            (Some(token), _, _) if !token.trim().is_empty() => {
                Some(Arc::new(StaticTokenProvider::new(token.clone())))
            }
            (_, Some(email), Some(password)) => Some(Arc::new(PasswordTokenProvider::new(
                http_client.clone(),
                &config.base_url,
                email.clone(),
                password.clone(),
            ))),
            _ => None,
        };

        Ok(Self { http_client, auth, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn http_client_for(config: &ApiClientConfig) -> Result<HttpClient, ApiError> {
        HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .user_agent(concat!("leadflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))
    }

    /// Execute a GET request and decode the JSON body
    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, path, |request| request.query(query)).await
    }

    /// Execute a POST request with no body and decode the JSON response
    #[instrument(skip(self), fields(path = %path))]
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::POST, path, |request| request).await
    }

    /// Execute a request built by `customize` against `path`.
    ///
    /// `customize` may be called twice (after a 401), so it must build any
    /// body from scratch.
    pub async fn execute<T, F>(&self, method: Method, path: &str, customize: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%method, url = %url, "API request");

        let mut response = self.send_once(&method, &url, &customize).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(auth) = &self.auth {
                warn!(url = %url, "Token rejected, refreshing and retrying once");
                auth.invalidate().await;
                response = self.send_once(&method, &url, &customize).await?;
            }
        }

        Self::decode(response, &url).await
    }

    async fn send_once<F>(&self, method: &Method, url: &str, customize: &F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut request = customize(self.http_client.request(method.clone(), url));
        if let Some(auth) = &self.auth {
            let token = auth.access_token().await?;
            request = request.bearer_auth(token);
        }

        self.http_client.send(request).await.map_err(ApiError::from)
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, url, &body));
        }

        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Decode(format!(
                    "No content response ({}), but a body was expected",
                    status.as_u16()
                ))
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response from {url}: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response from {url}: {e}")))
    }

    pub(crate) fn map_status_error(status: StatusCode, url: &str, body: &str) -> ApiError {
        let detail = error_detail(body);
        let message = match &detail {
            Some(detail) => detail.clone(),
            None => format!("{url} returned status {status}"),
        };

        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST if is_nothing_to_send(detail.as_deref()) => {
                ApiError::NothingToSend(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(message)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit(message),
            status if status.is_server_error() => ApiError::Server(message),
            status if status.is_client_error() => ApiError::Client(message),
            _ => ApiError::Network(message),
        }
    }
}

/// The server reports failures as `{"detail": ...}`; validation failures
/// carry a structured detail which is kept as JSON text.
fn error_detail(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}

fn is_nothing_to_send(detail: Option<&str>) -> bool {
    detail.is_some_and(|text| text.to_lowercase().contains("nenhum lead"))
}
