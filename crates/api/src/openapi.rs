use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Billing API",
        description = "Subscription status and self-serve billing for GitHub App accounts.",
        version = "1.0.0",
        license(name = "MIT",)
    ),
    paths(
        crate::routes::health_check,
        // Billing endpoints
        crate::routes::accounts::stripe_self_serve_redirect,
        crate::routes::accounts::get_subscription_info,
        crate::routes::accounts::get_active_users,
        crate::routes::accounts::start_trial,
    ),
    components(schemas(
        crate::models::HealthResponse,
        crate::models::SubscriptionInfoResponse,
        crate::models::ActiveUserResponse,
        crate::models::ActiveUsersResponse,
        crate::models::StartTrialRequest,
        crate::error::ApiErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Billing", description = "Per-account subscription and billing endpoints")
    )
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer token authentication
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("session_token")
                        .description(Some("Session token issued at login"))
                        .build(),
                ),
            )
        }
    }
}
