//! Server-rendered share cards for social crawlers.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use services::services::{
    crawler_gateway::{CODE_QUERY_KEY, PARTY_QUERY_KEY},
    og_metadata::{CHEER_QUERY_KEY, ShareVariant},
};
use tracing::warn;

use crate::AppState;

pub const RENDERER_PATH: &str = "/api/og";

/// GET /api/og?party={party_code}&code={candidate_code}[&cheer=1]
///
/// Always 200 with an HTML body. Misses and lookup failures get the site card.
pub async fn get_share_card(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let first = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let variant = ShareVariant::from_flag(first(CHEER_QUERY_KEY));
    let page = state
        .renderer()
        .render(first(PARTY_QUERY_KEY), first(CODE_QUERY_KEY), variant)
        .await;

    let cacheable = page.is_cacheable();
    let mut response = Html(page.html).into_response();
    if cacheable {
        match HeaderValue::from_str(&state.config().cache.header_value()) {
            Ok(value) => {
                response.headers_mut().insert(CACHE_CONTROL, value);
            }
            Err(e) => warn!(error = %e, "Invalid cache-control header value"),
        }
    }
    response
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route(RENDERER_PATH, get(get_share_card))
}
