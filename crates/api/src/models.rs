use serde::{Deserialize, Serialize};
use services::{activity::ActiveUser, subscription::SubscriptionStatus};
use utoipa::ToSchema;

/// Subscription state of an account, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionInfoResponse {
    /// Personal account, active trial, or seats within the licensed quantity
    ValidSubscription,
    /// The account's trial window has passed
    TrialExpired,
    /// More users were active in the last 30 days than seats were licensed
    #[serde(rename_all = "camelCase")]
    SubscriptionOverage {
        active_user_count: i64,
        license_count: i64,
    },
}

impl From<SubscriptionStatus> for SubscriptionInfoResponse {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::ValidSubscription => Self::ValidSubscription,
            SubscriptionStatus::TrialExpired => Self::TrialExpired,
            SubscriptionStatus::SubscriptionOverage {
                active_user_count,
                license_count,
            } => Self::SubscriptionOverage {
                active_user_count,
                license_count,
            },
        }
    }
}

/// A GitHub user counted as a seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActiveUserResponse {
    /// GitHub user id
    pub id: i64,
    /// GitHub login
    pub login: String,
}

impl From<ActiveUser> for ActiveUserResponse {
    fn from(user: ActiveUser) -> Self {
        Self {
            id: user.github_user_id,
            login: user.github_user_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersResponse {
    /// Users active on private repositories in the last 30 days, ordered by login
    pub active_users: Vec<ActiveUserResponse>,
}

/// Request to start the free trial
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartTrialRequest {
    /// Address that receives billing notices for the trial
    pub billing_email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
}
