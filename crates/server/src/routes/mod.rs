use axum::{Router, middleware::from_fn_with_state};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{AppState, error::ApiError, middleware::crawler_gateway::crawler_gateway};

pub mod health;
pub mod og;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .merge(og::router(&state))
        .merge(health::router(&state));

    // Voter-facing single-page app; unknown paths get index.html for client routing.
    let routes = match state.config().static_dir.clone() {
        Some(dir) => {
            let index = dir.join("index.html");
            routes.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => routes.fallback(not_found),
    };

    routes
        .layer(from_fn_with_state(state.clone(), crawler_gateway))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
