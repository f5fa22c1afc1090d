//! Session Store - single source of truth for authentication state
//!
//! The store keeps three views of the session consistent:
//!
//! - the durable record in a [`SessionBackend`],
//! - an in-memory snapshot served by [`SessionStore::read`],
//! - a replay-latest broadcast feeding every [`SessionStream`].
//!
//! Writes are serialized. A write becomes visible in the snapshot and to
//! observers only after the backend accepted it, and observers receive writes
//! in the order they were persisted.

use super::{Session, SessionBackend};
use attendance_core::{validation_error, AttendanceResult, Role};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Buffered session updates per observer before it starts skipping ahead
const OBSERVER_BUFFER: usize = 64;

pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    /// Last value accepted by the backend
    current: RwLock<Session>,
    /// Serializes persist + publish
    write_lock: Mutex<()>,
    notifier: broadcast::Sender<Session>,
}

impl SessionStore {
    /// Open the store, seeding the snapshot from the backend.
    ///
    /// A backend that cannot be read yields an empty session rather than an error.
    pub async fn open(backend: Arc<dyn SessionBackend>) -> Self {
        let initial = match backend.load().await {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    backend = %backend.describe(),
                    error = %e,
                    "Failed to load persisted session; starting empty"
                );
                Session::default()
            }
        };

        info!(
            backend = %backend.describe(),
            logged_in = initial.is_logged_in(),
            "Session store opened"
        );

        Self::with_initial(backend, initial)
    }

    fn with_initial(backend: Arc<dyn SessionBackend>, initial: Session) -> Self {
        let (notifier, _) = broadcast::channel(OBSERVER_BUFFER);

        Self {
            backend,
            current: RwLock::new(initial),
            write_lock: Mutex::new(()),
            notifier,
        }
    }

    /// Last known session, without touching the backend.
    ///
    /// Reflects the most recent write completed through this store, or the
    /// value loaded by [`open`](Self::open) / [`load`](Self::load). Changes made
    /// to the backend by other processes are not seen until the next `load`.
    pub fn read(&self) -> Session {
        self.current.read().clone()
    }

    /// Durable read.
    ///
    /// Returns an empty session if the backend fails. A successful read that
    /// differs from the snapshot replaces it and is published to observers.
    pub async fn load(&self) -> Session {
        let _guard = self.write_lock.lock().await;

        match self.backend.load().await {
            Ok(session) => {
                if *self.current.read() != session {
                    debug!("Persisted session changed outside this store; publishing");
                    self.publish(session.clone());
                }
                session
            }
            Err(e) => {
                warn!(error = %e, "Durable session read failed; returning empty session");
                Session::default()
            }
        }
    }

    /// Stream of sessions: the current value first, then every later write in order.
    ///
    /// The stream only ends when the store is dropped. Each call starts an
    /// independent subscription.
    pub fn observe(&self) -> SessionStream {
        // Snapshot and subscribe under the same lock publishers take, so no
        // write can land between the two.
        let current = self.current.read();
        let receiver = self.notifier.subscribe();
        SessionStream::new(current.clone(), receiver)
    }

    /// Number of live observers
    pub fn subscriber_count(&self) -> usize {
        self.notifier.receiver_count()
    }

    /// Persist a fully populated session and return it as stored
    pub async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        role: Role,
        euid: &str,
    ) -> AttendanceResult<Session> {
        if access_token.trim().is_empty() {
            return Err(validation_error!(
                "access token must not be empty",
                "access_token",
                "session_store"
            ));
        }
        if euid.trim().is_empty() {
            return Err(validation_error!(
                "euid must not be empty",
                "euid",
                "session_store"
            ));
        }

        let session = Session::new(access_token, refresh_token, role, euid);
        let _guard = self.write_lock.lock().await;

        self.backend.store(&session).await?;
        info!(role = %role, euid = %euid, "Session stored");
        self.publish(session.clone());

        Ok(session)
    }

    /// Persist the empty session
    pub async fn clear(&self) -> AttendanceResult<()> {
        let _guard = self.write_lock.lock().await;

        self.backend.clear().await?;
        info!("Session cleared");
        self.publish(Session::default());

        Ok(())
    }

    fn publish(&self, session: Session) {
        let mut current = self.current.write();
        *current = session.clone();
        // No receivers is fine; the snapshot still holds the value
        let _ = self.notifier.send(session);
    }
}

/// Infinite stream of session values produced by [`SessionStore::observe`]
pub struct SessionStream {
    inner: BoxStream<'static, Session>,
}

impl SessionStream {
    fn new(initial: Session, receiver: broadcast::Receiver<Session>) -> Self {
        let inner = stream::unfold(
            (Some(initial), receiver),
            |(pending, mut receiver)| async move {
                if let Some(session) = pending {
                    return Some((session, (None, receiver)));
                }

                loop {
                    match receiver.recv().await {
                        Ok(session) => return Some((session, (None, receiver))),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session observer lagged; skipping to newer values");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        )
        .boxed();

        Self { inner }
    }
}

impl Stream for SessionStream {
    type Item = Session;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySessionBackend;

    #[tokio::test]
    async fn open_seeds_snapshot_from_backend() {
        let persisted = Session::new("AT1", "RT1", Role::Professor, "abc1234");
        let backend = Arc::new(MemorySessionBackend::with_session(persisted.clone()));
        let store = SessionStore::open(backend).await;
        assert_eq!(store.read(), persisted);
    }

    #[tokio::test]
    async fn open_with_failing_backend_starts_empty() {
        let backend = Arc::new(MemorySessionBackend::with_session(Session::new(
            "AT1",
            "RT1",
            Role::Student,
            "stu1234",
        )));
        backend.set_failing(true);
        let store = SessionStore::open(backend).await;
        assert!(store.read().is_empty());
    }

    #[tokio::test]
    async fn half_populated_sessions_are_rejected() {
        let backend = Arc::new(MemorySessionBackend::new());
        let store = SessionStore::open(backend.clone()).await;

        assert!(store
            .set_session("", "RT1", Role::Student, "stu1234")
            .await
            .is_err());
        assert!(store
            .set_session("AT1", "RT1", Role::Student, "  ")
            .await
            .is_err());
        assert_eq!(backend.write_count(), 0);
        assert!(store.read().is_empty());
    }

    #[tokio::test]
    async fn set_session_returns_what_it_stored() {
        let backend = Arc::new(MemorySessionBackend::new());
        let store = SessionStore::open(backend.clone()).await;

        let stored = store
            .set_session("AT1", "RT1", Role::Professor, "abc1234")
            .await
            .unwrap();
        assert_eq!(stored, Session::new("AT1", "RT1", Role::Professor, "abc1234"));
        assert_eq!(backend.load().await.unwrap(), stored);
    }

    #[tokio::test]
    async fn dropped_observers_are_not_counted() {
        let store = SessionStore::open(Arc::new(MemorySessionBackend::new())).await;
        let first = store.observe();
        let second = store.observe();
        assert_eq!(store.subscriber_count(), 2);
        drop(first);
        drop(second);
        assert_eq!(store.subscriber_count(), 0);
    }
}
