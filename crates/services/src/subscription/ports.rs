use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::{Account, AccountError};
use crate::activity::ActiveUser;
use crate::types::{AccountId, UserId};

/// Local mirror of a Stripe customer and its subscription, keyed by `customer_id`.
/// Timestamps are unix seconds as reported by Stripe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeCustomerInformation {
    pub customer_id: String,
    pub subscription_id: String,
    pub plan_id: String,
    pub customer_email: String,
    pub customer_balance: i64,
    pub customer_created: i64,
    /// Price per seat in cents
    pub plan_amount: i64,
    /// Number of licensed seats
    pub subscription_quantity: i64,
    pub subscription_start_date: i64,
    pub subscription_current_period_start: i64,
    pub subscription_current_period_end: i64,
}

/// A hosted billing portal session
#[derive(Debug, Clone)]
pub struct BillingPortalSession {
    pub id: String,
    pub url: String,
}

/// Outcome of checking an account's subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    ValidSubscription,
    TrialExpired,
    SubscriptionOverage {
        active_user_count: i64,
        license_count: i64,
    },
}

/// Error types for subscription operations
#[derive(Debug)]
pub enum SubscriptionError {
    /// Account does not exist or the user is not a member of it
    AccountNotFound,
    /// Stripe is not configured
    NotConfigured,
    /// Stripe API error
    StripeError(String),
    /// Database error
    DatabaseError(String),
    /// Internal error
    InternalError(String),
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountNotFound => write!(f, "Account not found"),
            Self::NotConfigured => write!(f, "Stripe is not configured"),
            Self::StripeError(msg) => write!(f, "Stripe error: {}", msg),
            Self::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<anyhow::Error> for SubscriptionError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<AccountError> for SubscriptionError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound => Self::AccountNotFound,
            AccountError::Internal(e) => Self::DatabaseError(e.to_string()),
            other => Self::InternalError(other.to_string()),
        }
    }
}

/// Repository trait for mirrored Stripe customer records
#[async_trait]
pub trait StripeCustomerInformationRepository: Send + Sync {
    async fn get_by_customer_id(
        &self,
        customer_id: &str,
    ) -> anyhow::Result<Option<StripeCustomerInformation>>;

    /// Insert or replace the record for `info.customer_id`
    async fn upsert(
        &self,
        info: StripeCustomerInformation,
    ) -> anyhow::Result<StripeCustomerInformation>;
}

/// Payment provider that can host a self-serve billing portal
#[async_trait]
pub trait BillingPortal: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Register `account` as a customer with the provider. Returns the new customer id
    async fn create_customer(&self, account: &Account) -> Result<String, SubscriptionError>;

    async fn create_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<BillingPortalSession, SubscriptionError>;
}

/// Service trait for subscription status and billing
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Classify the account's subscription as valid, trial-expired or over its seat count
    async fn get_subscription_info(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<SubscriptionStatus, SubscriptionError>;

    /// Create a billing portal session for the account's Stripe customer, registering the
    /// customer first if the account has none. Returns the portal URL
    async fn create_billing_portal_session(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<String, SubscriptionError>;

    /// Distinct users active on the account's private repositories in the last 30 days
    async fn get_active_users(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Vec<ActiveUser>, SubscriptionError>;
}
