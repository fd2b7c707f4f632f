use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{SessionId, UserId};

/// Session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 30;

/// Authenticated session belonging to a user
#[derive(Debug, Clone)]
pub struct UserSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The actual session token (only populated on creation, not on retrieval)
    pub token: Option<String>,
}

impl UserSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Repository trait for authentication session management
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a user session (returns the session with the unhashed token)
    async fn create_session(&self, user_id: UserId) -> anyhow::Result<UserSession>;

    /// Retrieve a session by token hash
    async fn get_session_by_token_hash(
        &self,
        token_hash: String,
    ) -> anyhow::Result<Option<UserSession>>;

    /// Delete a session
    async fn delete_session(&self, session_id: SessionId) -> anyhow::Result<()>;
}
