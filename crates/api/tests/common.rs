#![allow(dead_code)]

use api::{create_router_with_cors, AppState};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use services::{
    account::{
        Account, AccountRepository, AccountRole, AccountServiceImpl, AccountType,
        CreateAccountParams, UpdateAccountParams,
    },
    activity::{PullRequestActivityRepository, UserPullRequestActivity},
    auth::SessionRepository,
    subscription::{
        StripeCustomerInformation, StripeCustomerInformationRepository,
        SubscriptionServiceConfig, SubscriptionServiceImpl,
    },
    test_helpers::{InMemoryStore, MockBillingPortal},
    user::{UpsertUserParams, User, UserRepository},
};
use std::sync::Arc;
use tokio::sync::OnceCell;

// Global once cell to ensure migrations only run once across all tests
static MIGRATIONS_INITIALIZED: OnceCell<()> = OnceCell::const_new();

pub const WEB_APP_URL: &str = "https://app.billing.example";
pub const PORTAL_URL: &str = "https://billing.stripe.com/session/bps_test_123";
pub const STRIPE_CUSTOMER_ID: &str = "cus_Ged32s2xnx12";

/// A running test server plus handles on its backing fakes
pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub portal: Arc<MockBillingPortal>,
}

/// Create a test server backed by an in-memory store and a configured mock billing portal
pub fn create_test_server() -> TestContext {
    create_test_server_with_portal(MockBillingPortal::new(PORTAL_URL))
}

/// Create a test server with a specific billing portal
pub fn create_test_server_with_portal(portal: MockBillingPortal) -> TestContext {
    let store = Arc::new(InMemoryStore::new());
    let portal = Arc::new(portal);

    let account_service = Arc::new(AccountServiceImpl::new(store.clone()));
    let subscription_service = Arc::new(SubscriptionServiceImpl::new(SubscriptionServiceConfig {
        account_service: account_service.clone(),
        account_repository: store.clone(),
        stripe_customer_info_repo: store.clone(),
        activity_repo: store.clone(),
        billing_portal: portal.clone(),
        web_app_url: WEB_APP_URL.to_string(),
    }));

    let app_state = AppState {
        account_service,
        subscription_service,
        session_repository: store.clone(),
    };

    let cors = config::CorsConfig {
        exact_matches: vec![WEB_APP_URL.to_string()],
        wildcard_suffixes: vec![],
    };
    let app = create_router_with_cors(app_state, cors);

    TestContext {
        server: TestServer::new(app).expect("Failed to create test server"),
        store,
        portal,
    }
}

pub async fn create_user(store: &InMemoryStore, github_id: i64, login: &str) -> User {
    store
        .upsert_user(UpsertUserParams {
            github_id,
            github_login: login.to_string(),
            github_access_token: format!("gho_{login}"),
        })
        .await
        .expect("Failed to create user")
}

/// Create an account of `account_type` with `user` as a member
pub async fn create_account(
    store: &InMemoryStore,
    user: &User,
    account_type: AccountType,
) -> Account {
    let account = store
        .create_account(CreateAccountParams {
            github_installation_id: 377930,
            github_account_id: 900966,
            github_account_login: "acme-corp".to_string(),
            github_account_type: account_type,
        })
        .await
        .expect("Failed to create account");

    store
        .add_membership(account.id, user.id, AccountRole::Member)
        .await
        .expect("Failed to add membership");

    account
}

/// Set the trial window to end `days_from_now` days from now (negative means in the past)
pub async fn set_trial_expiration(store: &InMemoryStore, account: &Account, days_from_now: i64) {
    let now = Utc::now();
    store
        .update_account(
            account.id,
            UpdateAccountParams {
                trial_start: Some(Some(now - Duration::days(30 - days_from_now))),
                trial_expiration: Some(Some(now + Duration::days(days_from_now))),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to set trial");
}

/// Link the account to a Stripe customer licensed for `quantity` seats
pub async fn create_stripe_customer_info(store: &InMemoryStore, account: &Account, quantity: i64) {
    store
        .update_account(
            account.id,
            UpdateAccountParams {
                stripe_customer_id: Some(Some(STRIPE_CUSTOMER_ID.to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to link customer");

    let now = Utc::now().timestamp();
    store
        .upsert(StripeCustomerInformation {
            customer_id: STRIPE_CUSTOMER_ID.to_string(),
            subscription_id: "sub_Gu1xedsfo1".to_string(),
            plan_id: "plan_G2df31A4G5JzQ".to_string(),
            customer_email: "accounting@acme-corp.com".to_string(),
            customer_balance: 0,
            customer_created: now - 86_400 * 60,
            plan_amount: 499,
            subscription_quantity: quantity,
            subscription_start_date: now - 86_400 * 60,
            subscription_current_period_start: now - 86_400 * 15,
            subscription_current_period_end: now + 86_400 * 15,
        })
        .await
        .expect("Failed to store customer info");
}

/// Record a private-repository pull request by `user_id` today, plus a bot on the same PR
pub async fn create_active_user(store: &InMemoryStore, account: &Account, user_id: i64) {
    let today = Utc::now().date_naive();
    for (id, login) in [
        (user_id, format!("user-{user_id}")),
        (0, "merge-helper[bot]".to_string()),
    ] {
        store
            .record_activity(UserPullRequestActivity {
                github_installation_id: account.github_installation_id,
                github_repository_name: "acme-api".to_string(),
                github_pull_request_number: user_id,
                github_user_login: login,
                github_user_id: id,
                is_private_repository: true,
                activity_date: today,
                opened_pull_request: id == user_id,
            })
            .await
            .expect("Failed to record activity");
    }
}

/// Create a session for `user` and return its bearer token
pub async fn login(store: &InMemoryStore, user: &User) -> String {
    store
        .create_session(user.id)
        .await
        .expect("Failed to create session")
        .token
        .expect("New sessions carry their token")
}

pub fn auth_header(token: &str) -> (http::HeaderName, http::HeaderValue) {
    (
        http::HeaderName::from_static("authorization"),
        http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Connect to the Postgres database from the environment and apply migrations once.
/// Returns `None` when no database is reachable.
pub async fn connect_test_database() -> Option<database::Database> {
    dotenvy::dotenv().ok();

    let config = config::DatabaseConfig::default();
    let db = match database::Database::from_config(&config).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!(
                "Skipping Postgres test, no database at {}:{}: {:#}",
                config.host, config.port, e
            );
            return None;
        }
    };

    // Run migrations only once, even when tests run in parallel
    MIGRATIONS_INITIALIZED
        .get_or_init(|| async {
            db.run_migrations()
                .await
                .expect("Failed to run database migrations");
        })
        .await;

    Some(db)
}

/// A positive id that will not collide with rows left by other tests
pub fn unique_github_id() -> i64 {
    (services::AccountId::new().0.as_u128() >> 65) as i64
}
