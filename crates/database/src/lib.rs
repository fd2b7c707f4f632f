pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, DbPool};
pub use repositories::{
    PostgresAccountRepository, PostgresPullRequestActivityRepository, PostgresSessionRepository,
    PostgresStripeCustomerInformationRepository, PostgresUserRepository,
};

use anyhow::Result;
use std::sync::Arc;

/// Database service combining all repositories
pub struct Database {
    pool: DbPool,
    user_repository: Arc<PostgresUserRepository>,
    session_repository: Arc<PostgresSessionRepository>,
    account_repository: Arc<PostgresAccountRepository>,
    stripe_customer_information_repository: Arc<PostgresStripeCustomerInformationRepository>,
    pull_request_activity_repository: Arc<PostgresPullRequestActivityRepository>,
}

impl Database {
    /// Create a new database service from a connection pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
            session_repository: Arc::new(PostgresSessionRepository::new(pool.clone())),
            account_repository: Arc::new(PostgresAccountRepository::new(pool.clone())),
            stripe_customer_information_repository: Arc::new(
                PostgresStripeCustomerInformationRepository::new(pool.clone()),
            ),
            pull_request_activity_repository: Arc::new(
                PostgresPullRequestActivityRepository::new(pool.clone()),
            ),
            pool,
        }
    }

    /// Create a new database service from configuration
    pub async fn from_config(config: &config::DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn user_repository(&self) -> Arc<PostgresUserRepository> {
        self.user_repository.clone()
    }

    pub fn session_repository(&self) -> Arc<PostgresSessionRepository> {
        self.session_repository.clone()
    }

    pub fn account_repository(&self) -> Arc<PostgresAccountRepository> {
        self.account_repository.clone()
    }

    pub fn stripe_customer_information_repository(
        &self,
    ) -> Arc<PostgresStripeCustomerInformationRepository> {
        self.stripe_customer_information_repository.clone()
    }

    pub fn pull_request_activity_repository(&self) -> Arc<PostgresPullRequestActivityRepository> {
        self.pull_request_activity_repository.clone()
    }
}
