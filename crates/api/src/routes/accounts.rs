use crate::{
    error::ApiError,
    middleware::AuthenticatedUser,
    models::{ActiveUsersResponse, StartTrialRequest, SubscriptionInfoResponse},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use services::{account::AccountError, subscription::SubscriptionError, AccountId};

/// Translate a subscription failure into an HTTP error; `action` names the operation in logs
fn subscription_error(err: SubscriptionError, action: &str) -> ApiError {
    match err {
        SubscriptionError::AccountNotFound => ApiError::account_not_found(),
        SubscriptionError::NotConfigured => {
            ApiError::service_unavailable("Stripe is not configured")
        }
        SubscriptionError::StripeError(msg) => {
            tracing::error!(error = ?msg, "Stripe error {}", action);
            ApiError::bad_gateway("Failed to communicate with Stripe")
        }
        SubscriptionError::DatabaseError(msg) => {
            tracing::error!(error = ?msg, "Database error {}", action);
            ApiError::internal_server_error(format!("Failed {}", action))
        }
        SubscriptionError::InternalError(msg) => {
            tracing::error!(error = ?msg, "Internal error {}", action);
            ApiError::internal_server_error(format!("Failed {}", action))
        }
    }
}

/// Redirect to the Stripe self-serve billing portal
///
/// Opens a billing portal session for the account's Stripe customer and redirects the
/// browser to it, registering the customer first when the account has none. Leaving the
/// portal returns to the account's usage page.
#[utoipa::path(
    get,
    path = "/v1/t/{account_id}/stripe_self_serve_redirect",
    tag = "Billing",
    params(("account_id" = AccountId, Path, description = "Account id")),
    responses(
        (status = 302, description = "Redirect to the billing portal"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ApiErrorResponse),
        (status = 502, description = "Stripe request failed", body = crate::error::ApiErrorResponse),
        (status = 503, description = "Stripe not configured", body = crate::error::ApiErrorResponse)
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn stripe_self_serve_redirect(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, ApiError> {
    tracing::info!(
        "Creating billing portal redirect for user_id={}, account_id={}",
        user.user_id,
        account_id
    );

    let url = app_state
        .subscription_service
        .create_billing_portal_session(user.user_id, account_id)
        .await
        .map_err(|e| subscription_error(e, "creating billing portal session"))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// Get subscription status
///
/// Reports whether the account's subscription is valid, its trial has expired, or more
/// users were active in the last 30 days than seats were licensed.
#[utoipa::path(
    get,
    path = "/v1/t/{account_id}/subscription_info",
    tag = "Billing",
    params(("account_id" = AccountId, Path, description = "Account id")),
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionInfoResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_subscription_info(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<SubscriptionInfoResponse>, ApiError> {
    tracing::info!(
        "Getting subscription info for user_id={}, account_id={}",
        user.user_id,
        account_id
    );

    let status = app_state
        .subscription_service
        .get_subscription_info(user.user_id, account_id)
        .await
        .map_err(|e| subscription_error(e, "getting subscription info"))?;

    Ok(Json(status.into()))
}

/// List active users
///
/// Distinct users with activity on the account's private repositories in the last 30 days.
#[utoipa::path(
    get,
    path = "/v1/t/{account_id}/active_users",
    tag = "Billing",
    params(("account_id" = AccountId, Path, description = "Account id")),
    responses(
        (status = 200, description = "Active users", body = ActiveUsersResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiErrorResponse)
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn get_active_users(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<ActiveUsersResponse>, ApiError> {
    tracing::debug!(
        "Listing active users for user_id={}, account_id={}",
        user.user_id,
        account_id
    );

    let active_users = app_state
        .subscription_service
        .get_active_users(user.user_id, account_id)
        .await
        .map_err(|e| subscription_error(e, "listing active users"))?;

    Ok(Json(ActiveUsersResponse {
        active_users: active_users.into_iter().map(Into::into).collect(),
    }))
}

/// Start the free trial
#[utoipa::path(
    post,
    path = "/v1/t/{account_id}/start_trial",
    tag = "Billing",
    params(("account_id" = AccountId, Path, description = "Account id")),
    request_body = StartTrialRequest,
    responses(
        (status = 204, description = "Trial started"),
        (status = 400, description = "Invalid billing email", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ApiErrorResponse),
        (status = 409, description = "Trial already started", body = crate::error::ApiErrorResponse)
    ),
    security(
        ("session_token" = [])
    )
)]
pub async fn start_trial(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
    Json(req): Json<StartTrialRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(
        "Starting trial for user_id={}, account_id={}",
        user.user_id,
        account_id
    );

    let billing_email = req.billing_email.trim().to_string();
    if !billing_email.contains('@') {
        return Err(ApiError::bad_request("Invalid billingEmail"));
    }

    app_state
        .account_service
        .start_trial(user.user_id, account_id, billing_email)
        .await
        .map_err(|e| match e {
            AccountError::NotFound => ApiError::account_not_found(),
            AccountError::TrialAlreadyStarted => {
                ApiError::conflict("A trial has already been started for this account")
            }
            AccountError::Internal(err) => {
                tracing::error!(error = ?err, "Failed to start trial");
                ApiError::internal_server_error("Failed to start trial")
            }
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Create the account billing router; every route requires authentication
pub fn create_accounts_router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/t/{account_id}/stripe_self_serve_redirect",
            get(stripe_self_serve_redirect),
        )
        .route(
            "/v1/t/{account_id}/subscription_info",
            get(get_subscription_info),
        )
        .route("/v1/t/{account_id}/active_users", get(get_active_users))
        .route("/v1/t/{account_id}/start_trial", post(start_trial))
}
