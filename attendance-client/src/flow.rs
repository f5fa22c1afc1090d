//! Sign-in flows: validate input, call the backend, record the session
//!
//! The API client never touches the session store; these flows are the one
//! place where a successful auth response becomes the current session, with
//! the role implied by the flow that produced it.

use attendance_core::{log_operation_error, AttendanceResult, Role};
use attendance_session::{Session, SessionStore};
use std::sync::Arc;
use tracing::info;

use crate::api::AuthApi;
use crate::models::{HealthResponse, TokenResponse};
use crate::validation::{
    validate_class_code, validate_euid, validate_join_code, validate_password, validate_photo,
};

pub struct AuthFlow {
    api: Arc<dyn AuthApi>,
    sessions: Arc<SessionStore>,
}

impl AuthFlow {
    pub fn new(api: Arc<dyn AuthApi>, sessions: Arc<SessionStore>) -> Self {
        Self { api, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Password login; the session is recorded with the professor role
    pub async fn login_professor(&self, euid: &str, password: &str) -> AttendanceResult<Session> {
        let euid = validate_euid(euid)?;
        validate_password(password)?;

        let tokens = self
            .api
            .login(&euid, password)
            .await
            .inspect_err(|e| {
                log_operation_error!("login_professor", e, euid = %euid);
            })?;

        self.apply(tokens, Role::Professor, &euid).await
    }

    /// Student self-enrollment with a join code and reference photo
    pub async fn enroll_student(
        &self,
        euid: &str,
        class_code: &str,
        join_code: &str,
        photo: &str,
    ) -> AttendanceResult<Session> {
        let euid = validate_euid(euid)?;
        let class_code = validate_class_code(class_code)?;
        let join_code = validate_join_code(join_code)?;
        let photo = validate_photo(photo)?;

        let tokens = self
            .api
            .enroll(&euid, &class_code, &join_code, &photo)
            .await
            .inspect_err(|e| {
                log_operation_error!("enroll_student", e, euid = %euid);
            })?;

        self.apply(tokens, Role::Student, &euid).await
    }

    /// Biometric login for an already enrolled student
    pub async fn face_login_student(&self, euid: &str, photo: &str) -> AttendanceResult<Session> {
        let euid = validate_euid(euid)?;
        let photo = validate_photo(photo)?;

        let tokens = self
            .api
            .face_login(&euid, &photo)
            .await
            .inspect_err(|e| {
                log_operation_error!("face_login_student", e, euid = %euid);
            })?;

        self.apply(tokens, Role::Student, &euid).await
    }

    pub async fn logout(&self) -> AttendanceResult<()> {
        self.sessions.clear().await
    }

    pub async fn health(&self) -> AttendanceResult<HealthResponse> {
        self.api.health().await
    }

    async fn apply(&self, tokens: TokenResponse, role: Role, euid: &str) -> AttendanceResult<Session> {
        let session = self
            .sessions
            .set_session(&tokens.access_token, &tokens.refresh_token, role, euid)
            .await?;

        info!(
            role = %role,
            euid = %euid,
            request_id = ?tokens.request_id,
            "Signed in"
        );

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attendance_core::{AttendanceError, ErrorContext};
    use attendance_session::MemorySessionBackend;
    use parking_lot::Mutex;

    /// Records calls and answers with a fixed outcome
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        fail_with: Option<u16>,
    }

    impl FakeApi {
        fn ok() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(status),
            }
        }

        fn respond(&self, call: String) -> AttendanceResult<TokenResponse> {
            self.calls.lock().push(call);
            match self.fail_with {
                Some(status) => Err(AttendanceError::Api {
                    status: Some(status),
                    message: "invalid credentials".to_string(),
                    request_id: None,
                    source: None,
                    context: ErrorContext::new("fake_api"),
                }),
                None => Ok(TokenResponse {
                    status: "ok".to_string(),
                    access_token: "AT1".to_string(),
                    refresh_token: "RT1".to_string(),
                    request_id: Some("req-1".to_string()),
                }),
            }
        }
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn login(&self, euid: &str, _password: &str) -> AttendanceResult<TokenResponse> {
            self.respond(format!("login:{}", euid))
        }

        async fn enroll(
            &self,
            euid: &str,
            class_code: &str,
            join_code: &str,
            _photo: &str,
        ) -> AttendanceResult<TokenResponse> {
            self.respond(format!("enroll:{}:{}:{}", euid, class_code, join_code))
        }

        async fn face_login(&self, euid: &str, _photo: &str) -> AttendanceResult<TokenResponse> {
            self.respond(format!("face_login:{}", euid))
        }

        async fn health(&self) -> AttendanceResult<HealthResponse> {
            Ok(HealthResponse {
                status: "ok".to_string(),
                request_id: None,
            })
        }
    }

    async fn flow(api: Arc<FakeApi>) -> AuthFlow {
        let sessions = Arc::new(SessionStore::open(Arc::new(MemorySessionBackend::new())).await);
        AuthFlow::new(api, sessions)
    }

    #[tokio::test]
    async fn login_records_professor_session() {
        let api = Arc::new(FakeApi::ok());
        let flow = flow(api.clone()).await;

        let session = flow.login_professor(" abc1234 ", "pw").await.unwrap();
        assert_eq!(session, Session::new("AT1", "RT1", Role::Professor, "abc1234"));
        assert_eq!(flow.sessions().read(), session);
        assert_eq!(api.calls.lock().as_slice(), ["login:abc1234"]);
    }

    #[tokio::test]
    async fn enroll_and_face_login_record_student_sessions() {
        let api = Arc::new(FakeApi::ok());
        let flow = flow(api.clone()).await;

        let enrolled = flow
            .enroll_student("stu1234", " csce_4900_500 ", "AB12CD34", "aGVsbG8=")
            .await
            .unwrap();
        assert_eq!(enrolled.role_kind(), Some(Role::Student));

        flow.logout().await.unwrap();
        assert!(flow.sessions().read().is_empty());

        let face = flow.face_login_student("stu1234", "aGVsbG8=").await.unwrap();
        assert!(face.is_logged_in());
        assert_eq!(
            api.calls.lock().as_slice(),
            ["enroll:stu1234:csce_4900_500:AB12CD34", "face_login:stu1234"]
        );
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_backend() {
        let api = Arc::new(FakeApi::ok());
        let flow = flow(api.clone()).await;

        let result = flow.login_professor("", "pw").await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));

        let result = flow.login_professor("abc1234", "").await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));

        let result = flow
            .enroll_student("stu1234", "csce_4900_500", "lowercase", "aGVsbG8=")
            .await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));

        assert!(api.calls.lock().is_empty());
        assert!(flow.sessions().read().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn login_returns_its_own_session_despite_other_writers() {
        use futures::StreamExt;

        let api = Arc::new(FakeApi::ok());
        let flow = flow(api).await;

        // Another writer signs out as soon as anyone signs in
        let sessions = flow.sessions().clone();
        let mut updates = sessions.observe();
        let interferer = tokio::spawn(async move {
            while let Some(session) = updates.next().await {
                if session.is_logged_in() {
                    sessions.clear().await.unwrap();
                    return;
                }
            }
        });

        let session = flow.login_professor("abc1234", "pw").await.unwrap();
        assert_eq!(session, Session::new("AT1", "RT1", Role::Professor, "abc1234"));

        interferer.await.unwrap();
        assert!(flow.sessions().read().is_empty());
    }

    #[tokio::test]
    async fn failed_login_leaves_session_unchanged() {
        let api = Arc::new(FakeApi::failing(401));
        let flow = flow(api).await;
        flow.sessions()
            .set_session("OLD", "OLDR", Role::Student, "stu1234")
            .await
            .unwrap();

        let err = flow.login_professor("abc1234", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(flow.sessions().read().access_token.as_deref(), Some("OLD"));
    }
}
