pub mod error;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse};
pub use middleware::{auth_middleware, AuthState, AuthenticatedUser};
pub use models::*;
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_cors};
pub use state::AppState;
