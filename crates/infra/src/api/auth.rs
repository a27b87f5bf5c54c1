//! Bearer token providers for the lead server
//!
//! The server issues JWTs from a form login. A configured token is used as
//! is; otherwise the password provider logs in lazily, caches the token and
//! logs in again after the client reports a 401.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::errors::ApiError;
use crate::http::HttpClient;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token
    async fn access_token(&self) -> Result<String, ApiError>;

    /// Drop any cached token after the server rejected it.
    async fn invalidate(&self) {}
}

/// Pre-issued token from configuration.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Logs in with email and password through `POST /auth/login`.
pub struct PasswordTokenProvider {
    http: HttpClient,
    login_url: String,
    email: String,
    password: String,
    cached: RwLock<Option<String>>,
}

impl PasswordTokenProvider {
    pub fn new(
        http: HttpClient,
        base_url: &str,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http,
            login_url: format!("{}/auth/login", base_url.trim_end_matches('/')),
            email: email.into(),
            password: password.into(),
            cached: RwLock::new(None),
        }
    }

    async fn login(&self) -> Result<String, ApiError> {
        debug!(email = %self.email, "Logging in to lead server");
        let form = [("username", self.email.as_str()), ("password", self.password.as_str())];
        let request = self.http.request(Method::POST, &self.login_url).form(&form);
        let response = self.http.send(request).await.map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("login rejected with status {status}: {body}")));
        }

        let login: LoginResponse =
            response.json().await.map_err(|e| ApiError::Decode(format!("login response: {e}")))?;
        info!(email = %self.email, "Logged in to lead server");
        Ok(login.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for PasswordTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        self.cached.write().await.take();
    }
}
