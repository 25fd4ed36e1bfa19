mod content;
mod error;
mod health;
mod practice;
mod proxy;
mod session;

pub use error::{ApiError, ErrorResponse};
pub use session::bearer_token;

use axum::Router;

use crate::state::AppState;

/// Every route, with state attached. Layers are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(proxy::router())
        .merge(content::router())
        .merge(practice::router())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
