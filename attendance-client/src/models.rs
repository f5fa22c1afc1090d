//! Wire types for the attendance backend

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub euid: String,
    pub password: String,
}

/// Body of `POST /auth/enroll`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEnrollRequest {
    pub euid: String,
    /// Class code, e.g. `csce_4900_500`
    pub code: String,
    pub join_code: String,
    /// Base64-encoded reference photo
    pub photo: String,
}

/// Body of `POST /auth/face-login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceLoginRequest {
    pub euid: String,
    pub photo: String,
}

/// Successful response of every auth endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub status: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    /// Free-form: a list of field errors, an object, or a string
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
