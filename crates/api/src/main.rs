use api::{create_router_with_cors, AppState};
use services::{
    account::{AccountService, AccountServiceImpl},
    subscription::{
        StripeBillingPortal, SubscriptionService, SubscriptionServiceConfig,
        SubscriptionServiceImpl,
    },
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
        eprintln!("Continuing with environment variables...");
    }

    // Load configuration from environment
    let config = config::Config::from_env();

    // RUST_LOG wins over the configured levels when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter_directive()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting API server...");
    tracing::info!(
        "Database: {}:{}/{}",
        config.database.host,
        config.database.port,
        config.database.database
    );
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);

    // Create database and run migrations
    tracing::info!("Connecting to database...");
    let db = database::Database::from_config(&config.database).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    // Create services
    tracing::info!("Initializing services...");
    let account_service: Arc<dyn AccountService> =
        Arc::new(AccountServiceImpl::new(db.account_repository()));

    if !config.stripe.is_configured() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; billing portal redirects will fail");
    }
    let billing_portal = Arc::new(StripeBillingPortal::new(config.stripe.secret_key.clone()));

    let subscription_service: Arc<dyn SubscriptionService> =
        Arc::new(SubscriptionServiceImpl::new(SubscriptionServiceConfig {
            account_service: account_service.clone(),
            account_repository: db.account_repository(),
            stripe_customer_info_repo: db.stripe_customer_information_repository(),
            activity_repo: db.pull_request_activity_repository(),
            billing_portal,
            web_app_url: config.web_app.base_url(),
        }));

    // Create application state
    let app_state = AppState {
        account_service,
        subscription_service,
        session_repository: db.session_repository(),
    };

    let app = create_router_with_cors(app_state, config.cors.clone());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
