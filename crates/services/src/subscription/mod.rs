pub mod ports;
pub mod service;
pub mod stripe_portal;

// Re-export commonly used types
pub use ports::{
    BillingPortal, BillingPortalSession, StripeCustomerInformation,
    StripeCustomerInformationRepository, SubscriptionError, SubscriptionService,
    SubscriptionStatus,
};
pub use service::{SubscriptionServiceConfig, SubscriptionServiceImpl};
pub use stripe_portal::StripeBillingPortal;
