//! Public share gateway for candidate pages.
//!
//! Serves the voter-facing single-page app and, for social-media link
//! previewers, redirects candidate page requests to a server-rendered Open
//! Graph card so shared links unfurl with the candidate's name and photo.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    routes::router(state)
}
