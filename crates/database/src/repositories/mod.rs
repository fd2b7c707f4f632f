pub mod account_repository;
pub mod pull_request_activity_repository;
pub mod session_repository;
pub mod stripe_customer_information_repository;
pub mod user_repository;

pub use account_repository::PostgresAccountRepository;
pub use pull_request_activity_repository::PostgresPullRequestActivityRepository;
pub use session_repository::PostgresSessionRepository;
pub use stripe_customer_information_repository::PostgresStripeCustomerInformationRepository;
pub use user_repository::PostgresUserRepository;
