//! Attendance backend client

use async_trait::async_trait;
use attendance_core::{performance, AttendanceError, AttendanceResult, ErrorContext};
use attendance_session::SessionStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    create_http_client, handle_response_error, transport_error, ApiClientConfig, AuthApi,
    REQUEST_ID_HEADER,
};
use crate::models::{
    FaceLoginRequest, HealthResponse, LoginRequest, StudentEnrollRequest, TokenResponse,
};

/// Client for the attendance backend.
///
/// Holds no session state of its own: the bearer token is read from the
/// shared [`SessionStore`] snapshot when each request is built, and results are
/// never written back. Callers apply successful auth responses themselves
/// (see [`AuthFlow`](crate::AuthFlow)).
pub struct AttendanceApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    sessions: Arc<SessionStore>,
}

impl AttendanceApiClient {
    /// Create a new client
    pub fn new(config: ApiClientConfig, sessions: Arc<SessionStore>) -> AttendanceResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created attendance API client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            sessions,
        })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// `Authorization` header value for the current session, if it has a token
    pub fn authorization_header(&self) -> Option<String> {
        self.sessions
            .read()
            .bearer_token()
            .map(|token| format!("Bearer {}", token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, operation: &str) -> AttendanceResult<T> {
        let request = self.client.get(self.config.endpoint(path));
        self.execute(request, operation).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, operation: &str) -> AttendanceResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.config.endpoint(path)).json(body);
        self.execute(request, operation).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> AttendanceResult<T> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut request = request.header(REQUEST_ID_HEADER, &request_id);

        if let Some(value) = self.authorization_header() {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }

        debug!(operation, request_id = %request_id, "Sending backend request");

        let response = performance::measure_async(operation, request.send())
            .await
            .map_err(|e| transport_error(e, operation, &request_id))?;

        let status = response.status();
        if !status.is_success() {
            let error = handle_response_error(response, operation).await;
            error.log();
            return Err(error);
        }

        response.json::<T>().await.map_err(|e| AttendanceError::Api {
            status: Some(status.as_u16()),
            message: format!("Failed to parse response: {}", e),
            request_id: Some(request_id),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Check that the API base URL points at the attendance backend"),
        })
    }
}

#[async_trait]
impl AuthApi for AttendanceApiClient {
    async fn login(&self, euid: &str, password: &str) -> AttendanceResult<TokenResponse> {
        info!(euid = %euid, "Logging in");

        let body = LoginRequest {
            euid: euid.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/login", &body, "login").await
    }

    async fn enroll(
        &self,
        euid: &str,
        class_code: &str,
        join_code: &str,
        photo: &str,
    ) -> AttendanceResult<TokenResponse> {
        info!(euid = %euid, class_code = %class_code, "Enrolling student");

        let body = StudentEnrollRequest {
            euid: euid.to_string(),
            code: class_code.to_string(),
            join_code: join_code.to_string(),
            photo: photo.to_string(),
        };
        self.post("/auth/enroll", &body, "enroll").await
    }

    async fn face_login(&self, euid: &str, photo: &str) -> AttendanceResult<TokenResponse> {
        info!(euid = %euid, "Face login");

        let body = FaceLoginRequest {
            euid: euid.to_string(),
            photo: photo.to_string(),
        };
        self.post("/auth/face-login", &body, "face_login").await
    }

    async fn health(&self) -> AttendanceResult<HealthResponse> {
        self.get("/health", "health").await
    }
}
