//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type AttendanceResult<T> = Result<T, AttendanceError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the attendance client
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// The durable session backend could not be read or written
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// A backend call failed, either in transport (`status` is `None`) or with an HTTP error
    #[error("{}", format_api_error(*status, message))]
    Api {
        status: Option<u16>,
        message: String,
        request_id: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Caller-side input rejected before any request was issued
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

fn format_api_error(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API error (HTTP {}): {}", code, message),
        None => format!("API error: {}", message),
    }
}

impl AttendanceError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            AttendanceError::Storage { context, .. } => Some(context),
            AttendanceError::Api { context, .. } => Some(context),
            AttendanceError::Validation { context, .. } => Some(context),
            AttendanceError::Config { context, .. } => Some(context),
            AttendanceError::Io(_) => None,
        }
    }

    /// HTTP status carried by an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AttendanceError::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Short human-readable message suitable for showing next to a form
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::Api { message, .. }
            | AttendanceError::Storage { message, .. }
            | AttendanceError::Validation { message, .. }
            | AttendanceError::Config { message, .. } => message.clone(),
            AttendanceError::Io(e) => e.to_string(),
        }
    }

    /// Check if re-invoking the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            AttendanceError::Api { status: None, .. } => true,
            AttendanceError::Api {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            AttendanceError::Storage { .. } => true,
            AttendanceError::Io(_) => true,
            AttendanceError::Validation { .. } | AttendanceError::Config { .. } => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AttendanceError::Config { .. } | AttendanceError::Validation { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            AttendanceError::Api { status, .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    status = ?status,
                    error = %self,
                    "Backend request failed"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::AttendanceError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the session directory exists and is writable"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::AttendanceError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the session directory exists and is writable"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::AttendanceError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'attendance config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::AttendanceError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}
