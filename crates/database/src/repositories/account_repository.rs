use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    account::{
        Account, AccountMembership, AccountRepository, AccountRole, AccountType,
        CreateAccountParams, UpdateAccountParams,
    },
    AccountId, UserId,
};
use tokio_postgres::Row;

const ACCOUNT_COLUMNS: &str = "id, github_installation_id, github_account_id, github_account_login,
     github_account_type, stripe_customer_id, trial_start, trial_expiration,
     trial_started_by, trial_email, created_at, updated_at";

pub struct PostgresAccountRepository {
    pool: DbPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: &Row) -> anyhow::Result<Account> {
    let account_type: String = row.get("github_account_type");
    let github_account_type: AccountType = account_type.parse()?;

    Ok(Account {
        id: row.get("id"),
        github_installation_id: row.get("github_installation_id"),
        github_account_id: row.get("github_account_id"),
        github_account_login: row.get("github_account_login"),
        github_account_type,
        stripe_customer_id: row.get("stripe_customer_id"),
        trial_start: row.get("trial_start"),
        trial_expiration: row.get("trial_expiration"),
        trial_started_by: row.get("trial_started_by"),
        trial_email: row.get("trial_email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_membership(row: &Row) -> anyhow::Result<AccountMembership> {
    let role: String = row.get("role");
    Ok(AccountMembership {
        account_id: row.get("account_id"),
        user_id: row.get("user_id"),
        role: role.parse::<AccountRole>()?,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get_account(&self, account_id: AccountId) -> anyhow::Result<Option<Account>> {
        tracing::debug!("Repository: Fetching account by account_id={}", account_id);

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"),
                &[&account_id],
            )
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn get_account_for_member(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Account>> {
        tracing::debug!(
            "Repository: Fetching account for member - account_id={}, user_id={}",
            account_id,
            user_id
        );

        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT a.id, a.github_installation_id, a.github_account_id,
                        a.github_account_login, a.github_account_type, a.stripe_customer_id,
                        a.trial_start, a.trial_expiration, a.trial_started_by, a.trial_email,
                        a.created_at, a.updated_at
                 FROM accounts a
                 JOIN account_memberships m ON m.account_id = a.id
                 WHERE a.id = $1 AND m.user_id = $2",
                &[&account_id, &user_id],
            )
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn create_account(&self, params: CreateAccountParams) -> anyhow::Result<Account> {
        tracing::info!(
            "Repository: Creating account - installation_id={}, login={}, type={}",
            params.github_installation_id,
            params.github_account_login,
            params.github_account_type.as_str()
        );

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "INSERT INTO accounts (id, github_installation_id, github_account_id,
                                           github_account_login, github_account_type)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING {ACCOUNT_COLUMNS}"
                ),
                &[
                    &AccountId::new(),
                    &params.github_installation_id,
                    &params.github_account_id,
                    &params.github_account_login,
                    &params.github_account_type.as_str(),
                ],
            )
            .await?;

        let account = row_to_account(&row)?;

        tracing::info!(
            "Repository: Account created - account_id={}, installation_id={}",
            account.id,
            account.github_installation_id
        );

        Ok(account)
    }

    async fn update_account(
        &self,
        account_id: AccountId,
        params: UpdateAccountParams,
    ) -> anyhow::Result<Account> {
        tracing::info!("Repository: Updating account account_id={}", account_id);

        let client = self.pool.get().await?;

        // Build dynamic update query
        let mut updates = Vec::new();
        let mut param_idx = 2;
        let mut values: Vec<Box<dyn tokio_postgres::types::ToSql + Sync + Send>> =
            vec![Box::new(account_id)];

        if let Some(account_type) = params.github_account_type {
            updates.push(format!("github_account_type = ${}", param_idx));
            values.push(Box::new(account_type.as_str().to_string()));
            param_idx += 1;
        }

        if let Some(stripe_customer_id) = params.stripe_customer_id {
            updates.push(format!("stripe_customer_id = ${}", param_idx));
            values.push(Box::new(stripe_customer_id));
            param_idx += 1;
        }

        if let Some(trial_start) = params.trial_start {
            updates.push(format!("trial_start = ${}", param_idx));
            values.push(Box::new(trial_start));
            param_idx += 1;
        }

        if let Some(trial_expiration) = params.trial_expiration {
            updates.push(format!("trial_expiration = ${}", param_idx));
            values.push(Box::new(trial_expiration));
            param_idx += 1;
        }

        if let Some(trial_started_by) = params.trial_started_by {
            updates.push(format!("trial_started_by = ${}", param_idx));
            values.push(Box::new(trial_started_by));
            param_idx += 1;
        }

        if let Some(trial_email) = params.trial_email {
            updates.push(format!("trial_email = ${}", param_idx));
            values.push(Box::new(trial_email));
        }

        if updates.is_empty() {
            return self
                .get_account(account_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Account not found"));
        }

        updates.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE accounts SET {} WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}",
            updates.join(", ")
        );

        let params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
            values.iter().map(|v| v.as_ref() as _).collect();

        let row = client
            .query_opt(&query, &params)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Account not found"))?;

        row_to_account(&row)
    }

    async fn add_membership(
        &self,
        account_id: AccountId,
        user_id: UserId,
        role: AccountRole,
    ) -> anyhow::Result<AccountMembership> {
        tracing::info!(
            "Repository: Adding membership - account_id={}, user_id={}, role={}",
            account_id,
            user_id,
            role.as_str()
        );

        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "INSERT INTO account_memberships (account_id, user_id, role)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (account_id, user_id) DO UPDATE SET role = EXCLUDED.role
                 RETURNING account_id, user_id, role, created_at",
                &[&account_id, &user_id, &role.as_str()],
            )
            .await?;

        row_to_membership(&row)
    }

    async fn list_memberships(
        &self,
        account_id: AccountId,
    ) -> anyhow::Result<Vec<AccountMembership>> {
        tracing::debug!(
            "Repository: Listing memberships for account_id={}",
            account_id
        );

        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT account_id, user_id, role, created_at
                 FROM account_memberships
                 WHERE account_id = $1
                 ORDER BY created_at",
                &[&account_id],
            )
            .await?;

        rows.iter().map(row_to_membership).collect()
    }
}
