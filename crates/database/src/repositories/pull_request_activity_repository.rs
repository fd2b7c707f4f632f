use crate::pool::DbPool;
use async_trait::async_trait;
use chrono::NaiveDate;
use services::activity::{
    ActiveUser, PullRequestActivityRepository, UserPullRequestActivity, BOT_LOGIN_SUFFIX,
};

pub struct PostgresPullRequestActivityRepository {
    pool: DbPool,
}

impl PostgresPullRequestActivityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `LIKE` pattern matching logins that end in the bot suffix
fn bot_login_pattern() -> String {
    let escaped = BOT_LOGIN_SUFFIX
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}")
}

#[async_trait]
impl PullRequestActivityRepository for PostgresPullRequestActivityRepository {
    async fn record_activity(&self, activity: UserPullRequestActivity) -> anyhow::Result<()> {
        tracing::debug!(
            "Repository: Recording activity - installation_id={}, repo={}, pr={}, user={}",
            activity.github_installation_id,
            activity.github_repository_name,
            activity.github_pull_request_number,
            activity.github_user_login
        );

        let client = self.pool.get().await?;

        client
            .execute(
                "INSERT INTO user_pull_request_activity (
                    github_installation_id, github_repository_name, github_pull_request_number,
                    github_user_login, github_user_id, is_private_repository, activity_date,
                    opened_pull_request
                 )
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT DO NOTHING",
                &[
                    &activity.github_installation_id,
                    &activity.github_repository_name,
                    &activity.github_pull_request_number,
                    &activity.github_user_login,
                    &activity.github_user_id,
                    &activity.is_private_repository,
                    &activity.activity_date,
                    &activity.opened_pull_request,
                ],
            )
            .await?;

        Ok(())
    }

    async fn get_active_users_since(
        &self,
        github_installation_id: i64,
        since: NaiveDate,
    ) -> anyhow::Result<Vec<ActiveUser>> {
        tracing::debug!(
            "Repository: Fetching active users - installation_id={}, since={}",
            github_installation_id,
            since
        );

        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT DISTINCT github_user_id, github_user_login
                 FROM user_pull_request_activity
                 WHERE github_installation_id = $1
                   AND activity_date >= $2
                   AND is_private_repository
                   AND github_user_login NOT LIKE $3
                 ORDER BY github_user_login",
                &[&github_installation_id, &since, &bot_login_pattern()],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ActiveUser {
                github_user_id: row.get("github_user_id"),
                github_user_login: row.get("github_user_login"),
            })
            .collect())
    }
}
