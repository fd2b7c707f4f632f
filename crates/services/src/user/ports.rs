use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::UserId;

/// A person signed in through GitHub
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub github_id: i64,
    pub github_login: String,
    pub github_access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create or refresh a user from a GitHub login
#[derive(Debug, Clone)]
pub struct UpsertUserParams {
    pub github_id: i64,
    pub github_login: String,
    pub github_access_token: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>>;

    async fn get_user_by_github_id(&self, github_id: i64) -> anyhow::Result<Option<User>>;

    /// Insert a user, or update login and access token when `github_id` already exists
    async fn upsert_user(&self, params: UpsertUserParams) -> anyhow::Result<User>;
}
