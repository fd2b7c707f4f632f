use crate::pool::DbPool;
use async_trait::async_trait;
use services::subscription::{StripeCustomerInformation, StripeCustomerInformationRepository};
use tokio_postgres::Row;

pub struct PostgresStripeCustomerInformationRepository {
    pool: DbPool,
}

impl PostgresStripeCustomerInformationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer_info(row: &Row) -> StripeCustomerInformation {
    StripeCustomerInformation {
        customer_id: row.get("customer_id"),
        subscription_id: row.get("subscription_id"),
        plan_id: row.get("plan_id"),
        customer_email: row.get("customer_email"),
        customer_balance: row.get("customer_balance"),
        customer_created: row.get("customer_created"),
        plan_amount: row.get("plan_amount"),
        subscription_quantity: row.get("subscription_quantity"),
        subscription_start_date: row.get("subscription_start_date"),
        subscription_current_period_start: row.get("subscription_current_period_start"),
        subscription_current_period_end: row.get("subscription_current_period_end"),
    }
}

#[async_trait]
impl StripeCustomerInformationRepository for PostgresStripeCustomerInformationRepository {
    async fn get_by_customer_id(
        &self,
        customer_id: &str,
    ) -> anyhow::Result<Option<StripeCustomerInformation>> {
        tracing::debug!(
            "Repository: Fetching Stripe customer information for customer_id={}",
            customer_id
        );

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT customer_id, subscription_id, plan_id, customer_email, customer_balance,
                        customer_created, plan_amount, subscription_quantity,
                        subscription_start_date, subscription_current_period_start,
                        subscription_current_period_end
                 FROM stripe_customer_information
                 WHERE customer_id = $1",
                &[&customer_id],
            )
            .await?;

        Ok(row.as_ref().map(row_to_customer_info))
    }

    async fn upsert(
        &self,
        info: StripeCustomerInformation,
    ) -> anyhow::Result<StripeCustomerInformation> {
        tracing::info!(
            "Repository: Upserting Stripe customer information - customer_id={}, subscription_id={}, quantity={}",
            info.customer_id,
            info.subscription_id,
            info.subscription_quantity
        );

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "INSERT INTO stripe_customer_information (
                    customer_id, subscription_id, plan_id, customer_email, customer_balance,
                    customer_created, plan_amount, subscription_quantity,
                    subscription_start_date, subscription_current_period_start,
                    subscription_current_period_end
                 )
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 ON CONFLICT (customer_id)
                 DO UPDATE SET
                     subscription_id = EXCLUDED.subscription_id,
                     plan_id = EXCLUDED.plan_id,
                     customer_email = EXCLUDED.customer_email,
                     customer_balance = EXCLUDED.customer_balance,
                     customer_created = EXCLUDED.customer_created,
                     plan_amount = EXCLUDED.plan_amount,
                     subscription_quantity = EXCLUDED.subscription_quantity,
                     subscription_start_date = EXCLUDED.subscription_start_date,
                     subscription_current_period_start = EXCLUDED.subscription_current_period_start,
                     subscription_current_period_end = EXCLUDED.subscription_current_period_end,
                     updated_at = NOW()
                 RETURNING customer_id, subscription_id, plan_id, customer_email, customer_balance,
                           customer_created, plan_amount, subscription_quantity,
                           subscription_start_date, subscription_current_period_start,
                           subscription_current_period_end",
                &[
                    &info.customer_id,
                    &info.subscription_id,
                    &info.plan_id,
                    &info.customer_email,
                    &info.customer_balance,
                    &info.customer_created,
                    &info.plan_amount,
                    &info.subscription_quantity,
                    &info.subscription_start_date,
                    &info.subscription_current_period_start,
                    &info.subscription_current_period_end,
                ],
            )
            .await?;

        Ok(row_to_customer_info(&row))
    }
}
