// Session - explicit identity context handed to every per-user client
// Replaces an ambient "current user" with a handle callers construct and inject

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::UserId;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: UserId,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(uid: UserId, email: impl Into<String>) -> Self {
        Session {
            uid,
            email: email.into(),
            signed_in_at: Utc::now(),
        }
    }
}

/// Shared, swappable slot for the active session. Cloning shares the slot,
/// so signing out through one handle is seen by every client holding a clone.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Handle with nobody signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Handle already holding a session (tests, restored logins)
    pub fn signed_in(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
        }
    }

    /// The active session, or `Unauthenticated`
    pub async fn current(&self) -> AppResult<Session> {
        self.inner.read().await.clone().ok_or(AppError::Unauthenticated)
    }

    pub async fn current_uid(&self) -> AppResult<UserId> {
        self.current().await.map(|s| s.uid)
    }

    pub async fn is_signed_in(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn replace(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Returns the session that was cleared, if any
    pub async fn clear(&self) -> Option<Session> {
        self.inner.write().await.take()
    }
}
