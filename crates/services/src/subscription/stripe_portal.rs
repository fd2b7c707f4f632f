use async_trait::async_trait;
use stripe::{
    BillingPortalSession as StripePortalSession, Client, CreateBillingPortalSession, CreateCustomer,
    Customer, CustomerId,
};

use super::ports::{BillingPortal, BillingPortalSession, SubscriptionError};
use crate::account::Account;

/// Billing portal hosted by Stripe
pub struct StripeBillingPortal {
    stripe_secret_key: String,
}

impl StripeBillingPortal {
    pub fn new(stripe_secret_key: String) -> Self {
        Self { stripe_secret_key }
    }

    /// Get Stripe client
    fn get_stripe_client(&self) -> Client {
        Client::new(&self.stripe_secret_key)
    }
}

#[async_trait]
impl BillingPortal for StripeBillingPortal {
    fn is_configured(&self) -> bool {
        !self.stripe_secret_key.is_empty()
    }

    async fn create_customer(&self, account: &Account) -> Result<String, SubscriptionError> {
        if !self.is_configured() {
            return Err(SubscriptionError::NotConfigured);
        }

        let client = self.get_stripe_client();

        let customer = Customer::create(
            &client,
            CreateCustomer {
                email: account.trial_email.as_deref(),
                name: Some(account.github_account_login.as_str()),
                metadata: Some(
                    vec![
                        ("account_id".to_string(), account.id.to_string()),
                        (
                            "github_installation_id".to_string(),
                            account.github_installation_id.to_string(),
                        ),
                    ]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| SubscriptionError::StripeError(e.to_string()))?;

        Ok(customer.id.to_string())
    }

    async fn create_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<BillingPortalSession, SubscriptionError> {
        if !self.is_configured() {
            tracing::debug!("Stripe secret key is empty, billing portal not configured");
            return Err(SubscriptionError::NotConfigured);
        }

        let customer_id_parsed: CustomerId = customer_id
            .parse()
            .map_err(|_| SubscriptionError::InternalError("Invalid customer ID format".into()))?;

        let client = self.get_stripe_client();
        let mut params = CreateBillingPortalSession::new(customer_id_parsed);
        params.return_url = Some(return_url);

        let session = StripePortalSession::create(&client, params)
            .await
            .map_err(|e| SubscriptionError::StripeError(e.to_string()))?;

        tracing::debug!(
            "Stripe billing portal session created: customer_id={}, session_id={}",
            customer_id,
            session.id
        );

        Ok(BillingPortalSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}
