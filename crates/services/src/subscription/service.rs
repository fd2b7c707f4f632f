use super::ports::{
    BillingPortal, StripeCustomerInformationRepository, SubscriptionError, SubscriptionService,
    SubscriptionStatus,
};
use crate::account::{Account, AccountRepository, AccountService, UpdateAccountParams};
use crate::activity::{ActiveUser, PullRequestActivityRepository, ACTIVE_USER_WINDOW_DAYS};
use crate::types::{AccountId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Configuration for SubscriptionServiceImpl
pub struct SubscriptionServiceConfig {
    pub account_service: Arc<dyn AccountService>,
    pub account_repository: Arc<dyn AccountRepository>,
    pub stripe_customer_info_repo: Arc<dyn StripeCustomerInformationRepository>,
    pub activity_repo: Arc<dyn PullRequestActivityRepository>,
    pub billing_portal: Arc<dyn BillingPortal>,
    /// Front-end base URL, without trailing slash
    pub web_app_url: String,
}

pub struct SubscriptionServiceImpl {
    account_service: Arc<dyn AccountService>,
    account_repository: Arc<dyn AccountRepository>,
    stripe_customer_info_repo: Arc<dyn StripeCustomerInformationRepository>,
    activity_repo: Arc<dyn PullRequestActivityRepository>,
    billing_portal: Arc<dyn BillingPortal>,
    web_app_url: String,
}

impl SubscriptionServiceImpl {
    pub fn new(config: SubscriptionServiceConfig) -> Self {
        Self {
            account_service: config.account_service,
            account_repository: config.account_repository,
            stripe_customer_info_repo: config.stripe_customer_info_repo,
            activity_repo: config.activity_repo,
            billing_portal: config.billing_portal,
            web_app_url: config.web_app_url,
        }
    }

    /// Where the billing portal sends the user back to
    fn usage_page_url(&self, account_id: AccountId) -> String {
        format!("{}/t/{}/usage", self.web_app_url, account_id)
    }

    /// Return the account's Stripe customer id, creating and storing one if it has none
    async fn get_or_create_customer_id(
        &self,
        account: &Account,
    ) -> Result<String, SubscriptionError> {
        if let Some(customer_id) = &account.stripe_customer_id {
            tracing::debug!(
                "Stripe customer already exists: account_id={}, customer_id={}",
                account.id,
                customer_id
            );
            return Ok(customer_id.clone());
        }

        tracing::info!("Creating new Stripe customer for account_id={}", account.id);
        let customer_id = self.billing_portal.create_customer(account).await?;

        self.account_repository
            .update_account(
                account.id,
                UpdateAccountParams {
                    stripe_customer_id: Some(Some(customer_id.clone())),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| SubscriptionError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Stripe customer created: account_id={}, customer_id={}",
            account.id,
            customer_id
        );

        Ok(customer_id)
    }

    async fn active_users_at(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveUser>, SubscriptionError> {
        let since = (now - Duration::days(ACTIVE_USER_WINDOW_DAYS)).date_naive();
        let users = self
            .activity_repo
            .get_active_users_since(account.github_installation_id, since)
            .await
            .map_err(|e| SubscriptionError::DatabaseError(e.to_string()))?;
        Ok(users)
    }

    async fn classify(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        // Personal accounts are never billed
        if account.is_personal() {
            return Ok(SubscriptionStatus::ValidSubscription);
        }

        if account.active_trial(now) {
            return Ok(SubscriptionStatus::ValidSubscription);
        }

        if account.trial_expired(now) {
            return Ok(SubscriptionStatus::TrialExpired);
        }

        let Some(customer_id) = account.stripe_customer_id.as_deref() else {
            return Ok(SubscriptionStatus::ValidSubscription);
        };

        let Some(customer_info) = self
            .stripe_customer_info_repo
            .get_by_customer_id(customer_id)
            .await
            .map_err(|e| SubscriptionError::DatabaseError(e.to_string()))?
        else {
            tracing::debug!(
                "No Stripe customer information mirrored: account_id={}, customer_id={}",
                account.id,
                customer_id
            );
            return Ok(SubscriptionStatus::ValidSubscription);
        };

        let active_user_count = self.active_users_at(account, now).await?.len() as i64;
        let license_count = customer_info.subscription_quantity;

        if active_user_count > license_count {
            tracing::info!(
                "Subscription overage: account_id={}, active_users={}, licenses={}",
                account.id,
                active_user_count,
                license_count
            );
            return Ok(SubscriptionStatus::SubscriptionOverage {
                active_user_count,
                license_count,
            });
        }

        Ok(SubscriptionStatus::ValidSubscription)
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionServiceImpl {
    async fn get_subscription_info(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        tracing::info!(
            "Getting subscription info: account_id={}, user_id={}",
            account_id,
            user_id
        );

        let account = self
            .account_service
            .get_account_for_user(user_id, account_id)
            .await?;

        let status = self.classify(&account, Utc::now()).await?;

        tracing::debug!(
            "Subscription status resolved: account_id={}, status={:?}",
            account_id,
            status
        );

        Ok(status)
    }

    async fn create_billing_portal_session(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<String, SubscriptionError> {
        tracing::info!(
            "Creating billing portal session: account_id={}, user_id={}",
            account_id,
            user_id
        );

        let account = self
            .account_service
            .get_account_for_user(user_id, account_id)
            .await?;

        if !self.billing_portal.is_configured() {
            tracing::debug!("Billing portal provider not configured");
            return Err(SubscriptionError::NotConfigured);
        }

        let customer_id = self.get_or_create_customer_id(&account).await?;

        let session = self
            .billing_portal
            .create_session(&customer_id, &self.usage_page_url(account.id))
            .await?;

        tracing::info!(
            "Billing portal session created: account_id={}, session_id={}",
            account_id,
            session.id
        );

        Ok(session.url)
    }

    async fn get_active_users(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Vec<ActiveUser>, SubscriptionError> {
        let account = self
            .account_service
            .get_account_for_user(user_id, account_id)
            .await?;

        self.active_users_at(&account, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{
        AccountRepository, AccountRole, AccountServiceImpl, AccountType, CreateAccountParams,
        UpdateAccountParams,
    };
    use crate::activity::UserPullRequestActivity;
    use crate::subscription::ports::StripeCustomerInformation;
    use crate::test_helpers::{InMemoryStore, MockBillingPortal};

    struct Fixture {
        store: Arc<InMemoryStore>,
        portal: Arc<MockBillingPortal>,
        service: SubscriptionServiceImpl,
        account: Account,
        user_id: UserId,
    }

    async fn fixture(account_type: AccountType) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let portal = Arc::new(MockBillingPortal::new(
            "https://billing.stripe.com/session/test",
        ));
        let account = store
            .create_account(CreateAccountParams {
                github_installation_id: 377930,
                github_account_id: 900966,
                github_account_login: "acme-corp".to_string(),
                github_account_type: account_type,
            })
            .await
            .unwrap();
        let user_id = UserId::new();
        store
            .add_membership(account.id, user_id, AccountRole::Member)
            .await
            .unwrap();

        let service = SubscriptionServiceImpl::new(SubscriptionServiceConfig {
            account_service: Arc::new(AccountServiceImpl::new(store.clone())),
            account_repository: store.clone(),
            stripe_customer_info_repo: store.clone(),
            activity_repo: store.clone(),
            billing_portal: portal.clone(),
            web_app_url: "https://app.example.com".to_string(),
        });

        Fixture {
            store,
            portal,
            service,
            account,
            user_id,
        }
    }

    fn customer_info(quantity: i64) -> StripeCustomerInformation {
        StripeCustomerInformation {
            customer_id: "cus_H2pvQ2kt7nk0JY".to_string(),
            subscription_id: "sub_Gu1xedsfo1".to_string(),
            plan_id: "plan_G2df31A4G5JzQ".to_string(),
            customer_email: "accounting@acme-corp.com".to_string(),
            customer_balance: 0,
            customer_created: 1585781308,
            plan_amount: 499,
            subscription_quantity: quantity,
            subscription_start_date: 1585781784,
            subscription_current_period_start: 0,
            subscription_current_period_end: 100,
        }
    }

    async fn record_user(store: &InMemoryStore, installation_id: i64, user_id: i64, days_ago: i64) {
        store
            .record_activity(UserPullRequestActivity {
                github_installation_id: installation_id,
                github_repository_name: "acme_web".to_string(),
                github_pull_request_number: user_id,
                github_user_login: format!("acme-user-{user_id}"),
                github_user_id: user_id,
                is_private_repository: true,
                activity_date: (Utc::now() - Duration::days(days_ago)).date_naive(),
                opened_pull_request: true,
            })
            .await
            .unwrap();
    }

    async fn subscribe(f: &Fixture, quantity: i64) {
        f.store.upsert(customer_info(quantity)).await.unwrap();
        f.store
            .update_account(
                f.account.id,
                UpdateAccountParams {
                    stripe_customer_id: Some(Some("cus_H2pvQ2kt7nk0JY".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_personal_account_ignores_overage() {
        let f = fixture(AccountType::User).await;
        subscribe(&f, 1).await;
        for i in 1..=3 {
            record_user(&f.store, 377930, i, 0).await;
        }

        let status = f
            .service
            .get_subscription_info(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(status, SubscriptionStatus::ValidSubscription);
    }

    #[tokio::test]
    async fn test_overage_counts_only_recent_activity() {
        let f = fixture(AccountType::Organization).await;
        subscribe(&f, 2).await;
        record_user(&f.store, 377930, 1, 0).await;
        record_user(&f.store, 377930, 2, 5).await;
        record_user(&f.store, 377930, 3, 29).await;
        record_user(&f.store, 377930, 4, 45).await;
        // another installation's users never count
        record_user(&f.store, 111111, 5, 0).await;

        let status = f
            .service
            .get_subscription_info(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(
            status,
            SubscriptionStatus::SubscriptionOverage {
                active_user_count: 3,
                license_count: 2
            }
        );
    }

    #[tokio::test]
    async fn test_seats_at_quota_is_valid() {
        let f = fixture(AccountType::Organization).await;
        subscribe(&f, 3).await;
        for i in 1..=3 {
            record_user(&f.store, 377930, i, 1).await;
        }

        let status = f
            .service
            .get_subscription_info(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(status, SubscriptionStatus::ValidSubscription);
    }

    #[tokio::test]
    async fn test_expired_trial_wins_over_overage() {
        let f = fixture(AccountType::Organization).await;
        subscribe(&f, 1).await;
        for i in 1..=4 {
            record_user(&f.store, 377930, i, 0).await;
        }
        f.store
            .update_account(
                f.account.id,
                UpdateAccountParams {
                    trial_expiration: Some(Some(Utc::now() - Duration::days(1))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let status = f
            .service
            .get_subscription_info(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(status, SubscriptionStatus::TrialExpired);
    }

    #[tokio::test]
    async fn test_portal_session_uses_customer_and_usage_return_url() {
        let f = fixture(AccountType::Organization).await;
        subscribe(&f, 3).await;

        let url = f
            .service
            .create_billing_portal_session(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(url, "https://billing.stripe.com/session/test");

        let calls = f.portal.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "cus_H2pvQ2kt7nk0JY");
        assert_eq!(
            calls[0].1,
            format!("https://app.example.com/t/{}/usage", f.account.id)
        );
    }

    #[tokio::test]
    async fn test_portal_session_creates_missing_customer_once() {
        let f = fixture(AccountType::User).await;

        f.service
            .create_billing_portal_session(f.user_id, f.account.id)
            .await
            .unwrap();
        let stored = f.store.get_account(f.account.id).await.unwrap().unwrap();
        let customer_id = stored.stripe_customer_id.expect("customer id stored");
        assert_eq!(f.portal.customers_created(), vec![f.account.id]);
        assert_eq!(f.portal.calls()[0].0, customer_id);

        // Second visit reuses the stored customer
        f.service
            .create_billing_portal_session(f.user_id, f.account.id)
            .await
            .unwrap();
        assert_eq!(f.portal.customers_created().len(), 1);
        assert_eq!(f.portal.calls()[1].0, customer_id);
    }

    #[tokio::test]
    async fn test_portal_session_not_configured_creates_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let portal = Arc::new(MockBillingPortal::not_configured());
        let account = store
            .create_account(CreateAccountParams {
                github_installation_id: 377930,
                github_account_id: 900966,
                github_account_login: "ghost".to_string(),
                github_account_type: AccountType::User,
            })
            .await
            .unwrap();
        let user_id = UserId::new();
        store
            .add_membership(account.id, user_id, AccountRole::Member)
            .await
            .unwrap();
        let service = SubscriptionServiceImpl::new(SubscriptionServiceConfig {
            account_service: Arc::new(AccountServiceImpl::new(store.clone())),
            account_repository: store.clone(),
            stripe_customer_info_repo: store.clone(),
            activity_repo: store.clone(),
            billing_portal: portal.clone(),
            web_app_url: "https://app.example.com".to_string(),
        });

        let err = service
            .create_billing_portal_session(user_id, account.id)
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::NotConfigured));
        assert!(portal.customers_created().is_empty());
        let stored = store.get_account(account.id).await.unwrap().unwrap();
        assert!(stored.stripe_customer_id.is_none());
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let f = fixture(AccountType::Organization).await;
        let err = f
            .service
            .get_subscription_info(f.user_id, AccountId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::AccountNotFound));
    }
}
