//! Attendance Client - authenticated access to the attendance backend
//!
//! - [`AttendanceApiClient`]: typed calls for login, enrollment, face login and
//!   health, with the session's bearer token attached automatically.
//! - [`AuthFlow`]: validates input, performs a sign-in call and records the
//!   resulting session in the shared [`SessionStore`](attendance_session::SessionStore).

pub mod api;
pub mod flow;
pub mod models;
pub mod validation;

pub use api::{ApiClientConfig, AttendanceApiClient, AuthApi, REQUEST_ID_HEADER};
pub use flow::AuthFlow;
pub use models::*;
