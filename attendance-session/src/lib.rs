//! Attendance Session - durable, observable authentication state
//!
//! [`SessionStore`] is constructed once at startup and shared (by `Arc`) with
//! the API client and whatever renders the UI. It persists through a
//! [`SessionBackend`] and replays the latest session to every observer.

pub mod storage;
pub mod store;
pub mod types;

pub use storage::{FileSessionBackend, MemorySessionBackend, SessionBackend};
pub use store::{SessionStore, SessionStream};
pub use types::Session;
