use axum::{
    extract::{Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use services::services::crawler_gateway::GatewayDecision;
use tracing::debug;

use crate::AppState;

/// Send social crawlers asking for a candidate page to the share-card
/// renderer with a 307. Everything else continues down the stack unchanged.
pub async fn crawler_gateway(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Header values may carry non-ASCII bytes; signatures are ASCII.
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let user_agent = user_agent.as_deref();
    let decision = state
        .gateway()
        .classify(request.uri().path(), request.uri().query(), user_agent);

    match decision {
        GatewayDecision::PassThrough => next.run(request).await,
        GatewayDecision::Redirect { location } => {
            debug!(
                path = %request.uri().path(),
                user_agent = user_agent.unwrap_or_default(),
                location = %location,
                "Redirecting social crawler to share card"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}
