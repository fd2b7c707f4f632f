use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    user::{UpsertUserParams, User, UserRepository},
    UserId,
};
use tokio_postgres::Row;

const USER_COLUMNS: &str =
    "id, github_id, github_login, github_access_token, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: DbPool,
}

impl PostgresUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &Row) -> User {
    User {
        id: row.get("id"),
        github_id: row.get("github_id"),
        github_login: row.get("github_login"),
        github_access_token: row.get("github_access_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>> {
        tracing::debug!("Repository: Fetching user by user_id={}", user_id);

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
                &[&user_id],
            )
            .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_user_by_github_id(&self, github_id: i64) -> anyhow::Result<Option<User>> {
        tracing::debug!("Repository: Fetching user by github_id={}", github_id);

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = $1"),
                &[&github_id],
            )
            .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn upsert_user(&self, params: UpsertUserParams) -> anyhow::Result<User> {
        tracing::info!(
            "Repository: Upserting user - github_id={}, github_login={}",
            params.github_id,
            params.github_login
        );

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "INSERT INTO users (id, github_id, github_login, github_access_token)
                     VALUES ($1, $2, $3, $4)
                     ON CONFLICT (github_id)
                     DO UPDATE SET github_login = EXCLUDED.github_login,
                                   github_access_token = EXCLUDED.github_access_token,
                                   updated_at = NOW()
                     RETURNING {USER_COLUMNS}"
                ),
                &[
                    &UserId::new(),
                    &params.github_id,
                    &params.github_login,
                    &params.github_access_token,
                ],
            )
            .await?;

        Ok(row_to_user(&row))
    }
}
