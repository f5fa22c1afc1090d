//! HTTP access to the attendance backend
//!
//! [`AttendanceApiClient`] implements [`AuthApi`] over `reqwest`, attaching the
//! bearer token from the shared session store to every request.

use async_trait::async_trait;
use attendance_core::{ApiConfig, AttendanceError, AttendanceResult, ErrorContext};
use std::collections::HashMap;

use crate::models::{ErrorResponse, HealthResponse, TokenResponse};

pub mod client;

#[cfg(test)]
mod tests;

pub use client::AttendanceApiClient;

/// Correlation header the backend echoes back
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Configuration pointing at `base_url` with default timeout and user agent
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Absolute URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Backend operations used by the sign-in flows
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, euid: &str, password: &str) -> AttendanceResult<TokenResponse>;

    /// `POST /auth/enroll`
    async fn enroll(
        &self,
        euid: &str,
        class_code: &str,
        join_code: &str,
        photo: &str,
    ) -> AttendanceResult<TokenResponse>;

    /// `POST /auth/face-login`
    async fn face_login(&self, euid: &str, photo: &str) -> AttendanceResult<TokenResponse>;

    /// `GET /health`
    async fn health(&self) -> AttendanceResult<HealthResponse>;
}

/// Build the HTTP client with the configured defaults
pub(crate) fn create_http_client(config: &ApiClientConfig) -> AttendanceResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            AttendanceError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            AttendanceError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| AttendanceError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| AttendanceError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Convert a non-2xx response into an API error.
///
/// The message is the `error` field of a JSON error body when there is one,
/// otherwise the raw body, otherwise the status reason phrase.
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> AttendanceError {
    let status = response.status();
    let header_request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let error_body = response.text().await.unwrap_or_default();
    let parsed: ErrorResponse = serde_json::from_str(&error_body).unwrap_or_default();

    let message = parsed
        .error
        .filter(|e| !e.trim().is_empty())
        .or_else(|| {
            let trimmed = error_body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    let request_id = parsed.request_id.or(header_request_id);

    let mut context = ErrorContext::new("api_client")
        .with_operation(operation)
        .with_metadata("status", status.as_str())
        .with_suggestion(match status.as_u16() {
            400 | 422 => "Check the submitted fields",
            401 => "Check your credentials and sign in again",
            403 => "Your account is not allowed to perform this action",
            404 => "Check the configured API base URL",
            429 => "Too many attempts; wait before retrying",
            _ => "Check network connectivity and API status",
        });
    if let Some(id) = &request_id {
        context = context.with_metadata("request_id", id);
    }

    AttendanceError::Api {
        status: Some(status.as_u16()),
        message,
        request_id,
        source: None,
        context,
    }
}

/// Convert a transport failure (no HTTP response) into an API error
pub(crate) fn transport_error(
    error: reqwest::Error,
    operation: &str,
    request_id: &str,
) -> AttendanceError {
    let message = if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_connect() {
        "Could not connect to the server".to_string()
    } else {
        format!("Request failed: {}", error)
    };

    AttendanceError::Api {
        status: error.status().map(|s| s.as_u16()),
        message,
        request_id: Some(request_id.to_string()),
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_metadata("request_id", request_id)
            .with_suggestion("Check network connectivity and the configured API base URL"),
    }
}
