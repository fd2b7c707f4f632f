use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn services::account::AccountService>,
    pub subscription_service: Arc<dyn services::subscription::SubscriptionService>,
    pub session_repository: Arc<dyn services::auth::SessionRepository>,
}
