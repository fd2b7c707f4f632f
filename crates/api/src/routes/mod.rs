pub mod accounts;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{middleware::AuthState, models::HealthResponse, openapi::ApiDoc, state::AppState};

/// Health check endpoint
///
/// Returns the health status of the API service. This endpoint is typically used by
/// load balancers, monitoring systems, and orchestration tools to verify service availability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn is_origin_allowed(origin_str: &str, cors_config: &config::CorsConfig) -> bool {
    if cors_config.exact_matches.iter().any(|o| o == origin_str) {
        return true;
    }

    if let Some(remainder) = origin_str.strip_prefix("http://localhost") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if let Some(remainder) = origin_str.strip_prefix("http://127.0.0.1") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if origin_str.starts_with("https://")
        && cors_config
            .wildcard_suffixes
            .iter()
            .any(|suffix| origin_str.ends_with(suffix))
    {
        return true;
    }

    false
}

/// Create the main API router, reading allowed origins from the environment
pub fn create_router(app_state: AppState) -> Router {
    create_router_with_cors(app_state, config::CorsConfig::default())
}

/// Create the main API router with CORS configuration
pub fn create_router_with_cors(app_state: AppState, cors_config: config::CorsConfig) -> Router {
    let auth_state = AuthState {
        session_repository: app_state.session_repository.clone(),
    };

    // Account billing routes (requires authentication)
    let account_routes = accounts::create_accounts_router().layer(from_fn_with_state(
        auth_state,
        crate::middleware::auth_middleware,
    ));

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(account_routes) // Account routes already carry the /v1/t prefix
        .with_state(app_state);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts: &http::request::Parts| {
                let origin_str = match origin.to_str() {
                    Ok(s) => s,
                    Err(_) => return false,
                };
                is_origin_allowed(origin_str, &cors_config)
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}
