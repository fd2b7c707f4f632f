use crate::pool::DbPool;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use services::{
    auth::{
        generate_session_token, hash_session_token, SessionRepository, UserSession,
        SESSION_TTL_DAYS,
    },
    SessionId, UserId,
};

pub struct PostgresSessionRepository {
    pool: DbPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create_session(&self, user_id: UserId) -> anyhow::Result<UserSession> {
        tracing::info!("Creating session for user_id={}", user_id);

        let client = self.pool.get().await?;

        let session_id = SessionId::new();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(SESSION_TTL_DAYS);

        let token = generate_session_token();
        let token_hash = hash_session_token(&token);

        let row = client
            .query_one(
                "INSERT INTO sessions (id, user_id, created_at, expires_at, token_hash)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, user_id, created_at, expires_at",
                &[&session_id, &user_id, &created_at, &expires_at, &token_hash],
            )
            .await?;

        let session = UserSession {
            session_id: row.get(0),
            user_id: row.get(1),
            created_at: row.get(2),
            expires_at: row.get(3),
            token: Some(token), // Return the unhashed token only on creation
        };

        tracing::info!(
            "Session created: session_id={}, user_id={}, expires_at={}",
            session.session_id,
            session.user_id,
            session.expires_at
        );

        Ok(session)
    }

    async fn get_session_by_token_hash(
        &self,
        token_hash: String,
    ) -> anyhow::Result<Option<UserSession>> {
        tracing::debug!(
            "Looking up session by token_hash: {}...",
            &token_hash.chars().take(16).collect::<String>()
        );

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, user_id, created_at, expires_at
                 FROM sessions
                 WHERE token_hash = $1",
                &[&token_hash],
            )
            .await?;

        Ok(row.map(|r| UserSession {
            session_id: r.get(0),
            user_id: r.get(1),
            created_at: r.get(2),
            expires_at: r.get(3),
            token: None, // Never return the token on retrieval
        }))
    }

    async fn delete_session(&self, session_id: SessionId) -> anyhow::Result<()> {
        tracing::info!("Deleting session: session_id={}", session_id);

        let client = self.pool.get().await?;

        client
            .execute("DELETE FROM sessions WHERE id = $1", &[&session_id])
            .await?;

        Ok(())
    }
}
