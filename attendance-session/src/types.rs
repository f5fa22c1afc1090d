//! Session model

use attendance_core::Role;
use serde::{Deserialize, Serialize};

/// The locally persisted record of the current authenticated identity.
///
/// Serialized as a flat object with the keys `access_token`, `refresh_token`,
/// `role` and `euid`. A missing key reads back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euid: Option<String>,
}

impl Session {
    /// Fully populated session
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        role: Role,
        euid: impl Into<String>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            role: Some(role.as_str().to_string()),
            euid: Some(euid.into()),
        }
    }

    /// True iff the access token and role are both present and not blank
    pub fn is_logged_in(&self) -> bool {
        not_blank(&self.access_token) && not_blank(&self.role)
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.role.is_none()
            && self.euid.is_none()
    }

    /// Access token suitable for an `Authorization: Bearer` header
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    /// Parsed role, `None` when absent or unrecognized
    pub fn role_kind(&self) -> Option<Role> {
        self.role.as_deref().and_then(|role| role.parse().ok())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.euid.as_deref()
    }
}

fn not_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
