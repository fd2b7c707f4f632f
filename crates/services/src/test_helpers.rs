//! In-memory implementations of the repository and provider ports, for tests and local runs
//! without Postgres or Stripe.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use tokio::sync::RwLock;

use crate::account::{
    Account, AccountMembership, AccountRepository, AccountRole, CreateAccountParams,
    UpdateAccountParams,
};
use crate::activity::{ActiveUser, PullRequestActivityRepository, UserPullRequestActivity};
use crate::auth::{
    generate_session_token, hash_session_token, SessionRepository, UserSession, SESSION_TTL_DAYS,
};
use crate::subscription::{
    BillingPortal, BillingPortalSession, StripeCustomerInformation,
    StripeCustomerInformationRepository, SubscriptionError,
};
use crate::types::{AccountId, SessionId, UserId};
use crate::user::{UpsertUserParams, User, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    sessions: HashMap<String, UserSession>,
    accounts: HashMap<AccountId, Account>,
    memberships: Vec<AccountMembership>,
    customers: HashMap<String, StripeCustomerInformation>,
    activity: Vec<UserPullRequestActivity>,
}

/// Every repository port backed by one set of in-memory tables
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a session past its expiry
    pub async fn expire_session(&self, session_id: SessionId) {
        let mut tables = self.tables.write().await;
        for session in tables.sessions.values_mut() {
            if session.session_id == session_id {
                session.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_github_id(&self, github_id: i64) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.github_id == github_id)
            .cloned())
    }

    async fn upsert_user(&self, params: UpsertUserParams) -> anyhow::Result<User> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(user) = tables
            .users
            .values_mut()
            .find(|u| u.github_id == params.github_id)
        {
            user.github_login = params.github_login;
            user.github_access_token = params.github_access_token;
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::new(),
            github_id: params.github_id,
            github_login: params.github_login,
            github_access_token: params.github_access_token,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create_session(&self, user_id: UserId) -> anyhow::Result<UserSession> {
        let token = generate_session_token();
        let created_at = Utc::now();
        let session = UserSession {
            session_id: SessionId::new(),
            user_id,
            created_at,
            expires_at: created_at + Duration::days(SESSION_TTL_DAYS),
            token: None,
        };
        self.tables
            .write()
            .await
            .sessions
            .insert(hash_session_token(&token), session.clone());
        Ok(UserSession {
            token: Some(token),
            ..session
        })
    }

    async fn get_session_by_token_hash(
        &self,
        token_hash: String,
    ) -> anyhow::Result<Option<UserSession>> {
        Ok(self.tables.read().await.sessions.get(&token_hash).cloned())
    }

    async fn delete_session(&self, session_id: SessionId) -> anyhow::Result<()> {
        self.tables
            .write()
            .await
            .sessions
            .retain(|_, s| s.session_id != session_id);
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn get_account(&self, account_id: AccountId) -> anyhow::Result<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&account_id).cloned())
    }

    async fn get_account_for_member(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Account>> {
        let tables = self.tables.read().await;
        let is_member = tables
            .memberships
            .iter()
            .any(|m| m.account_id == account_id && m.user_id == user_id);
        Ok(is_member
            .then(|| tables.accounts.get(&account_id).cloned())
            .flatten())
    }

    async fn create_account(&self, params: CreateAccountParams) -> anyhow::Result<Account> {
        let mut tables = self.tables.write().await;
        if tables
            .accounts
            .values()
            .any(|a| a.github_installation_id == params.github_installation_id)
        {
            anyhow::bail!(
                "Account already exists for installation {}",
                params.github_installation_id
            );
        }

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            github_installation_id: params.github_installation_id,
            github_account_id: params.github_account_id,
            github_account_login: params.github_account_login,
            github_account_type: params.github_account_type,
            stripe_customer_id: None,
            trial_start: None,
            trial_expiration: None,
            trial_started_by: None,
            trial_email: None,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(
        &self,
        account_id: AccountId,
        params: UpdateAccountParams,
    ) -> anyhow::Result<Account> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| anyhow::anyhow!("Account not found: {}", account_id))?;

        if let Some(kind) = params.github_account_type {
            account.github_account_type = kind;
        }
        if let Some(customer_id) = params.stripe_customer_id {
            account.stripe_customer_id = customer_id;
        }
        if let Some(trial_start) = params.trial_start {
            account.trial_start = trial_start;
        }
        if let Some(trial_expiration) = params.trial_expiration {
            account.trial_expiration = trial_expiration;
        }
        if let Some(started_by) = params.trial_started_by {
            account.trial_started_by = started_by;
        }
        if let Some(email) = params.trial_email {
            account.trial_email = email;
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn add_membership(
        &self,
        account_id: AccountId,
        user_id: UserId,
        role: AccountRole,
    ) -> anyhow::Result<AccountMembership> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .memberships
            .iter_mut()
            .find(|m| m.account_id == account_id && m.user_id == user_id)
        {
            existing.role = role;
            return Ok(existing.clone());
        }

        let membership = AccountMembership {
            account_id,
            user_id,
            role,
            created_at: Utc::now(),
        };
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn list_memberships(
        &self,
        account_id: AccountId,
    ) -> anyhow::Result<Vec<AccountMembership>> {
        Ok(self
            .tables
            .read()
            .await
            .memberships
            .iter()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StripeCustomerInformationRepository for InMemoryStore {
    async fn get_by_customer_id(
        &self,
        customer_id: &str,
    ) -> anyhow::Result<Option<StripeCustomerInformation>> {
        Ok(self.tables.read().await.customers.get(customer_id).cloned())
    }

    async fn upsert(
        &self,
        info: StripeCustomerInformation,
    ) -> anyhow::Result<StripeCustomerInformation> {
        self.tables
            .write()
            .await
            .customers
            .insert(info.customer_id.clone(), info.clone());
        Ok(info)
    }
}

#[async_trait]
impl PullRequestActivityRepository for InMemoryStore {
    async fn record_activity(&self, activity: UserPullRequestActivity) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.activity.iter().any(|a| {
            a.github_installation_id == activity.github_installation_id
                && a.github_repository_name == activity.github_repository_name
                && a.github_pull_request_number == activity.github_pull_request_number
                && a.github_user_id == activity.github_user_id
                && a.activity_date == activity.activity_date
        });
        if !duplicate {
            tables.activity.push(activity);
        }
        Ok(())
    }

    async fn get_active_users_since(
        &self,
        github_installation_id: i64,
        since: NaiveDate,
    ) -> anyhow::Result<Vec<ActiveUser>> {
        let tables = self.tables.read().await;
        let users: BTreeSet<_> = tables
            .activity
            .iter()
            .filter(|a| a.github_installation_id == github_installation_id)
            .filter(|a| a.counts_as_seat_since(since))
            .map(|a| ActiveUser {
                github_user_id: a.github_user_id,
                github_user_login: a.github_user_login.clone(),
            })
            .collect();

        let mut users: Vec<_> = users.into_iter().collect();
        users.sort_by(|a, b| a.github_user_login.cmp(&b.github_user_login));
        Ok(users)
    }
}

/// Billing portal that never leaves the process; records every request
pub struct MockBillingPortal {
    url: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
    customers_created: Mutex<Vec<AccountId>>,
}

impl MockBillingPortal {
    /// A configured portal that always answers with `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            calls: Mutex::new(Vec::new()),
            customers_created: Mutex::new(Vec::new()),
        }
    }

    /// A portal whose provider credentials are missing
    pub fn not_configured() -> Self {
        Self {
            url: None,
            calls: Mutex::new(Vec::new()),
            customers_created: Mutex::new(Vec::new()),
        }
    }

    /// `(customer_id, return_url)` pairs received so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Accounts a customer was registered for, in order
    pub fn customers_created(&self) -> Vec<AccountId> {
        self.customers_created
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BillingPortal for MockBillingPortal {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn create_customer(&self, account: &Account) -> Result<String, SubscriptionError> {
        if !self.is_configured() {
            return Err(SubscriptionError::NotConfigured);
        }
        if let Ok(mut created) = self.customers_created.lock() {
            created.push(account.id);
        }
        Ok(format!("cus_{}", uuid::Uuid::new_v4().simple()))
    }

    async fn create_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<BillingPortalSession, SubscriptionError> {
        let url = self.url.clone().ok_or(SubscriptionError::NotConfigured)?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((customer_id.to_string(), return_url.to_string()));
        }
        Ok(BillingPortalSession {
            id: format!("bps_{}", uuid::Uuid::new_v4().simple()),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(user_id: i64, login: &str, private: bool) -> UserPullRequestActivity {
        UserPullRequestActivity {
            github_installation_id: 377930,
            github_repository_name: "acme_web".to_string(),
            github_pull_request_number: 7,
            github_user_login: login.to_string(),
            github_user_id: user_id,
            is_private_repository: private,
            activity_date: Utc::now().date_naive(),
            opened_pull_request: true,
        }
    }

    #[tokio::test]
    async fn test_active_users_are_distinct_and_skip_bots() {
        let store = InMemoryStore::new();
        store.record_activity(activity(2, "acme-user-2", true)).await.unwrap();
        store.record_activity(activity(1, "acme-user-1", true)).await.unwrap();
        // same tuple twice is stored once
        store.record_activity(activity(1, "acme-user-1", true)).await.unwrap();
        store.record_activity(activity(0, "merge-bot[bot]", true)).await.unwrap();
        store.record_activity(activity(3, "acme-user-3", false)).await.unwrap();

        let since = (Utc::now() - Duration::days(30)).date_naive();
        let users = store.get_active_users_since(377930, since).await.unwrap();
        let logins: Vec<_> = users.iter().map(|u| u.github_user_login.as_str()).collect();
        assert_eq!(logins, vec!["acme-user-1", "acme-user-2"]);
    }

    #[tokio::test]
    async fn test_session_token_lookup_by_hash() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let session = store.create_session(user_id).await.unwrap();
        let token = session.token.unwrap();

        let found = store
            .get_session_by_token_hash(hash_session_token(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, user_id);
        assert!(found.token.is_none());

        store.delete_session(found.session_id).await.unwrap();
        assert!(store
            .get_session_by_token_hash(hash_session_token(&token))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_upsert_user_refreshes_existing_login() {
        let store = InMemoryStore::new();
        let first = store
            .upsert_user(UpsertUserParams {
                github_id: 10137,
                github_login: "ghost".to_string(),
                github_access_token: "token-1".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .upsert_user(UpsertUserParams {
                github_id: 10137,
                github_login: "ghost-renamed".to_string(),
                github_access_token: "token-2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.github_login, "ghost-renamed");
    }
}
