use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::{
    auth::{hash_session_token, is_well_formed_session_token, SessionRepository},
    SessionId, UserId,
};
use std::sync::Arc;

use crate::error::ApiError;

/// Authenticated user information inserted into request extensions by the auth middleware.
/// Extract in route handlers using `Extension<AuthenticatedUser>`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// State for authentication middleware
#[derive(Clone)]
pub struct AuthState {
    pub session_repository: Arc<dyn SessionRepository>,
}

/// Extract and validate token from Authorization header
fn extract_token_from_request(request: &Request) -> Result<String, ApiError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_value = auth_header.ok_or_else(|| {
        tracing::warn!("No authorization header found");
        ApiError::missing_auth_header()
    })?;

    let token = auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Authorization header does not start with 'Bearer '");
        ApiError::invalid_auth_header()
    })?;

    if !is_well_formed_session_token(token) {
        tracing::warn!(
            "Invalid session token format: length {}, prefix {}...",
            token.len(),
            &token.chars().take(5).collect::<String>()
        );
        return Err(ApiError::invalid_token());
    }

    Ok(token.to_string())
}

/// Authenticate a session by token hash
async fn authenticate_session_by_token(
    state: &AuthState,
    token_hash: String,
) -> Result<AuthenticatedUser, ApiError> {
    tracing::debug!(
        "Authenticating session by token hash: {}...",
        &token_hash.chars().take(16).collect::<String>()
    );

    let session = state
        .session_repository
        .get_session_by_token_hash(token_hash.clone())
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to get session from repository for token_hash {}...: {}",
                &token_hash.chars().take(16).collect::<String>(),
                e
            );
            ApiError::internal_server_error("Failed to authenticate session")
        })?
        .ok_or_else(|| {
            tracing::warn!(
                "Session not found for token_hash: {}...",
                &token_hash.chars().take(16).collect::<String>()
            );
            ApiError::session_not_found()
        })?;

    let now = Utc::now();
    if session.is_expired_at(now) {
        let time_expired = now.signed_duration_since(session.expires_at);
        tracing::warn!(
            "Session expired: session_id={}, expired {} seconds ago",
            session.session_id,
            time_expired.num_seconds()
        );
        return Err(ApiError::session_expired());
    }

    tracing::debug!(
        "Session valid: session_id={}, user_id={}, expires_at={}",
        session.session_id,
        session.user_id,
        session.expires_at
    );

    Ok(AuthenticatedUser {
        user_id: session.user_id,
        session_id: session.session_id,
    })
}

/// Authentication middleware that validates session tokens
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    tracing::debug!("Auth middleware invoked for {} {}", method, path);

    let token = extract_token_from_request(&request).map_err(|e| e.into_response())?;
    let user = authenticate_session_by_token(&state, hash_session_token(&token))
        .await
        .map_err(|e| e.into_response())?;

    tracing::info!(
        "Authentication successful for user_id={}, session_id={} on {} {}",
        user.user_id,
        user.session_id,
        method,
        path
    );
    request.extensions_mut().insert(user);
    let response = next.run(request).await;
    tracing::debug!("Request completed with status: {}", response.status());
    Ok(response)
}
