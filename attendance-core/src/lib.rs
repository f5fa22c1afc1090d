//! Attendance Core - shared error, configuration, logging and type definitions
//!
//! Everything the session store, API client and CLI have in common lives here.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
