use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{AccountId, UserId};

/// Kind of GitHub account a billing account was installed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// Personal account
    User,
    Organization,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "User",
            AccountType::Organization => "Organization",
        }
    }
}

impl FromStr for AccountType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(AccountType::User),
            "Organization" => Ok(AccountType::Organization),
            other => Err(anyhow::anyhow!("Unknown account type: {}", other)),
        }
    }
}

/// Role of a user within an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    Member,
    Admin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Member => "member",
            AccountRole::Admin => "admin",
        }
    }
}

impl FromStr for AccountRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(AccountRole::Member),
            "admin" => Ok(AccountRole::Admin),
            other => Err(anyhow::anyhow!("Unknown account role: {}", other)),
        }
    }
}

/// Billing entity tied to one GitHub App installation
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub github_installation_id: i64,
    pub github_account_id: i64,
    pub github_account_login: String,
    pub github_account_type: AccountType,
    pub stripe_customer_id: Option<String>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_expiration: Option<DateTime<Utc>>,
    pub trial_started_by: Option<UserId>,
    pub trial_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Trial window is set and has not yet passed.
    pub fn active_trial(&self, now: DateTime<Utc>) -> bool {
        self.trial_expiration.is_some_and(|exp| exp > now)
    }

    /// Trial window is set and already passed.
    pub fn trial_expired(&self, now: DateTime<Utc>) -> bool {
        self.trial_expiration.is_some_and(|exp| exp < now)
    }

    pub fn is_personal(&self) -> bool {
        self.github_account_type == AccountType::User
    }
}

#[derive(Debug, Clone)]
pub struct AccountMembership {
    pub account_id: AccountId,
    pub user_id: UserId,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub github_installation_id: i64,
    pub github_account_id: i64,
    pub github_account_login: String,
    pub github_account_type: AccountType,
}

/// Partial update; `None` leaves a field untouched, `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountParams {
    pub github_account_type: Option<AccountType>,
    pub stripe_customer_id: Option<Option<String>>,
    pub trial_start: Option<Option<DateTime<Utc>>>,
    pub trial_expiration: Option<Option<DateTime<Utc>>>,
    pub trial_started_by: Option<Option<UserId>>,
    pub trial_email: Option<Option<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account does not exist or the user is not a member of it
    #[error("Account not found")]
    NotFound,
    #[error("A trial has already been started for this account")]
    TrialAlreadyStarted,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_account(&self, account_id: AccountId) -> anyhow::Result<Option<Account>>;

    /// Fetch an account only if `user_id` holds a membership on it
    async fn get_account_for_member(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Account>>;

    async fn create_account(&self, params: CreateAccountParams) -> anyhow::Result<Account>;

    async fn update_account(
        &self,
        account_id: AccountId,
        params: UpdateAccountParams,
    ) -> anyhow::Result<Account>;

    /// Add (or re-role) a member
    async fn add_membership(
        &self,
        account_id: AccountId,
        user_id: UserId,
        role: AccountRole,
    ) -> anyhow::Result<AccountMembership>;

    async fn list_memberships(&self, account_id: AccountId)
        -> anyhow::Result<Vec<AccountMembership>>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    /// Look up an account the user is allowed to see
    async fn get_account_for_user(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Account, AccountError>;

    /// Start the free trial on an account that never had one
    async fn start_trial(
        &self,
        user_id: UserId,
        account_id: AccountId,
        billing_email: String,
    ) -> Result<Account, AccountError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account_with_trial(trial_expiration: Option<DateTime<Utc>>) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            github_installation_id: 377930,
            github_account_id: 900966,
            github_account_login: "acme-corp".to_string(),
            github_account_type: AccountType::Organization,
            stripe_customer_id: None,
            trial_start: None,
            trial_expiration,
            trial_started_by: None,
            trial_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_no_trial_is_neither_active_nor_expired() {
        let account = account_with_trial(None);
        let now = Utc::now();
        assert!(!account.active_trial(now));
        assert!(!account.trial_expired(now));
    }

    #[test]
    fn test_future_trial_is_active() {
        let now = Utc::now();
        let account = account_with_trial(Some(now + Duration::days(10)));
        assert!(account.active_trial(now));
        assert!(!account.trial_expired(now));
    }

    #[test]
    fn test_past_trial_is_expired() {
        let now = Utc::now();
        let account = account_with_trial(Some(now - Duration::days(10)));
        assert!(!account.active_trial(now));
        assert!(account.trial_expired(now));
    }

    #[test]
    fn test_account_type_round_trips_github_names() {
        assert_eq!("User".parse::<AccountType>().unwrap(), AccountType::User);
        assert_eq!(
            AccountType::Organization
                .as_str()
                .parse::<AccountType>()
                .unwrap(),
            AccountType::Organization
        );
        assert!("Bot".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_account_role_parses_stored_names() {
        assert_eq!(AccountRole::default(), AccountRole::Member);
        assert_eq!("admin".parse::<AccountRole>().unwrap(), AccountRole::Admin);
        assert_eq!(
            AccountRole::Member.as_str().parse::<AccountRole>().unwrap(),
            AccountRole::Member
        );
        let err = "owner".parse::<AccountRole>().unwrap_err();
        assert!(err.to_string().contains("owner"));
    }
}
