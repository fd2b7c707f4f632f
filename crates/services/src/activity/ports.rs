use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Window used when counting active seats
pub const ACTIVE_USER_WINDOW_DAYS: i64 = 30;

/// Logins with this suffix belong to GitHub Apps and never take a seat
pub const BOT_LOGIN_SUFFIX: &str = "[bot]";

/// One user's involvement with one pull request on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPullRequestActivity {
    pub github_installation_id: i64,
    pub github_repository_name: String,
    pub github_pull_request_number: i64,
    pub github_user_login: String,
    pub github_user_id: i64,
    pub is_private_repository: bool,
    pub activity_date: NaiveDate,
    pub opened_pull_request: bool,
}

impl UserPullRequestActivity {
    /// Whether this row counts towards the seat total for activity on or after `since`
    pub fn counts_as_seat_since(&self, since: NaiveDate) -> bool {
        self.is_private_repository
            && self.activity_date >= since
            && !is_bot_login(&self.github_user_login)
    }
}

pub fn is_bot_login(login: &str) -> bool {
    login.ends_with(BOT_LOGIN_SUFFIX)
}

/// A distinct GitHub user seen in recent activity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActiveUser {
    pub github_user_id: i64,
    pub github_user_login: String,
}

#[async_trait]
pub trait PullRequestActivityRepository: Send + Sync {
    /// Record activity; re-recording the same (installation, repo, PR, user, day) is a no-op
    async fn record_activity(&self, activity: UserPullRequestActivity) -> anyhow::Result<()>;

    /// Distinct non-bot users with private-repository activity on or after `since`,
    /// ordered by login
    async fn get_active_users_since(
        &self,
        github_installation_id: i64,
        since: NaiveDate,
    ) -> anyhow::Result<Vec<ActiveUser>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(login: &str, private: bool, date: NaiveDate) -> UserPullRequestActivity {
        UserPullRequestActivity {
            github_installation_id: 377930,
            github_repository_name: "acme_web".to_string(),
            github_pull_request_number: 1,
            github_user_login: login.to_string(),
            github_user_id: 1,
            is_private_repository: private,
            activity_date: date,
            opened_pull_request: true,
        }
    }

    #[test]
    fn test_seat_counting_rules() {
        let since = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        let in_window = NaiveDate::from_ymd_opt(2020, 4, 15).unwrap();
        let before_window = NaiveDate::from_ymd_opt(2020, 3, 31).unwrap();

        assert!(activity("acme-user-1", true, in_window).counts_as_seat_since(since));
        assert!(activity("acme-user-1", true, since).counts_as_seat_since(since));
        assert!(!activity("acme-user-1", true, before_window).counts_as_seat_since(since));
        assert!(!activity("acme-user-1", false, in_window).counts_as_seat_since(since));
        assert!(!activity("merge-bot[bot]", true, in_window).counts_as_seat_since(since));
    }
}
