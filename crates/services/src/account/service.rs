use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::ports::{Account, AccountError, AccountRepository, AccountService, UpdateAccountParams};
use crate::types::{AccountId, UserId};

/// Length of the free trial
pub const TRIAL_LENGTH_DAYS: i64 = 30;

pub struct AccountServiceImpl {
    account_repository: Arc<dyn AccountRepository>,
}

impl AccountServiceImpl {
    pub fn new(account_repository: Arc<dyn AccountRepository>) -> Self {
        Self { account_repository }
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn get_account_for_user(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Account, AccountError> {
        tracing::debug!(
            "Getting account for member: account_id={}, user_id={}",
            account_id,
            user_id
        );

        self.account_repository
            .get_account_for_member(account_id, user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    "Account not found or user is not a member: account_id={}, user_id={}",
                    account_id,
                    user_id
                );
                AccountError::NotFound
            })
    }

    async fn start_trial(
        &self,
        user_id: UserId,
        account_id: AccountId,
        billing_email: String,
    ) -> Result<Account, AccountError> {
        let account = self.get_account_for_user(user_id, account_id).await?;

        if account.trial_expiration.is_some() {
            tracing::info!(
                "Trial already started: account_id={}, trial_expiration={:?}",
                account_id,
                account.trial_expiration
            );
            return Err(AccountError::TrialAlreadyStarted);
        }

        let now = Utc::now();
        let expiration = now + Duration::days(TRIAL_LENGTH_DAYS);

        let updated = self
            .account_repository
            .update_account(
                account_id,
                UpdateAccountParams {
                    trial_start: Some(Some(now)),
                    trial_expiration: Some(Some(expiration)),
                    trial_started_by: Some(Some(user_id)),
                    trial_email: Some(Some(billing_email)),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(
            "Trial started: account_id={}, started_by={}, expires_at={}",
            account_id,
            user_id,
            expiration
        );

        Ok(updated)
    }
}
