//! Configuration management

use crate::error::{AttendanceError, AttendanceResult, ErrorContext};
use crate::types::{ApiConfig, ClientConfig, StorageConfig};

use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "ATTENDANCE_API_URL";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_seconds: 30,
            user_agent: format!("attendance-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_dir: "~/.attendance".to_string(),
            namespace: "auth".to_string(),
        }
    }
}

impl StorageConfig {
    /// Session directory with a leading `~` expanded to the home directory
    pub fn resolved_session_dir(&self) -> PathBuf {
        match self.session_dir.strip_prefix('~') {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
                None => PathBuf::from(&self.session_dir),
            },
            None => PathBuf::from(&self.session_dir),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AttendanceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AttendanceError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ClientConfig = toml::from_str(&content).map_err(|e| AttendanceError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> AttendanceResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| AttendanceError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| AttendanceError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply `ATTENDANCE_API_URL` if it is set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> AttendanceResult<()> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| AttendanceError::Config {
            message: format!("api.base_url is not a valid URL: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://127.0.0.1:8000"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AttendanceError::Config {
                message: format!("api.base_url must use http or https, got {}", parsed.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.base_url to an http(s) URL"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(AttendanceError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        // Checked as written; this exact string becomes the file name
        let namespace = self.storage.namespace.as_str();
        if namespace.is_empty()
            || namespace != namespace.trim()
            || namespace.contains(['/', '\\'])
            || namespace.starts_with('.')
        {
            return Err(AttendanceError::Config {
                message: format!("storage.namespace is not a valid name: {:?}", namespace),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use a plain name such as 'auth'"),
            });
        }

        Ok(())
    }
}
