//! Tests for the API client configuration and header handling

use super::*;
use attendance_core::Role;
use attendance_session::{MemorySessionBackend, SessionStore};
use std::sync::Arc;

async fn store() -> Arc<SessionStore> {
    Arc::new(SessionStore::open(Arc::new(MemorySessionBackend::new())).await)
}

#[test]
fn test_api_client_config_creation() {
    let config = ApiClientConfig::new("http://10.0.2.2:8000/");
    assert_eq!(config.base_url, "http://10.0.2.2:8000/");
    assert_eq!(config.timeout_seconds, 30);
    assert!(config.user_agent.starts_with("attendance-client/"));

    let config = config
        .with_timeout(5)
        .with_header("X-Client".to_string(), "cli".to_string());
    assert_eq!(config.timeout_seconds, 5);
    assert_eq!(config.headers.get("X-Client"), Some(&"cli".to_string()));
}

#[test]
fn test_config_from_core_settings() {
    let mut core = ApiConfig::default();
    core.base_url = "https://attendance.example.edu".to_string();
    core.timeout_seconds = 12;

    let config = ApiClientConfig::from(&core);
    assert_eq!(config.base_url, "https://attendance.example.edu");
    assert_eq!(config.timeout_seconds, 12);
    assert!(config.headers.is_empty());
}

#[test]
fn test_endpoint_joining() {
    let config = ApiClientConfig::new("http://localhost:8000/");
    assert_eq!(
        config.endpoint("/auth/login"),
        "http://localhost:8000/auth/login"
    );
    assert_eq!(config.endpoint("health"), "http://localhost:8000/health");
}

#[test]
fn test_invalid_header_is_config_error() {
    let config = ApiClientConfig::new("http://localhost:8000")
        .with_header("bad header".to_string(), "x".to_string());
    assert!(matches!(
        create_http_client(&config),
        Err(AttendanceError::Config { .. })
    ));
}

#[tokio::test]
async fn test_no_authorization_without_token() {
    let sessions = store().await;
    let client = AttendanceApiClient::new(ApiClientConfig::default(), sessions).unwrap();
    assert_eq!(client.authorization_header(), None);
}

#[tokio::test]
async fn test_authorization_follows_session() {
    let sessions = store().await;
    let client = AttendanceApiClient::new(ApiClientConfig::default(), sessions.clone()).unwrap();

    sessions
        .set_session("AT1", "RT1", Role::Professor, "abc1234")
        .await
        .unwrap();
    assert_eq!(client.authorization_header(), Some("Bearer AT1".to_string()));

    sessions.clear().await.unwrap();
    assert_eq!(client.authorization_header(), None);
}
