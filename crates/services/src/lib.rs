pub mod account;
pub mod activity;
pub mod auth;
pub mod subscription;
pub mod test_helpers;
pub mod types;
pub mod user;

pub use types::{AccountId, SessionId, UserId};
