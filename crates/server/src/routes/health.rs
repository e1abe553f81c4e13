use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, TS)]
pub struct HealthStatus {
    pub directory: String,
    pub party_codes: usize,
    pub version: String,
}

/// GET /api/health
/// Reports 503 when the candidate directory cannot be reached.
pub async fn get_health(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    state.directory().ping().await?;

    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        directory: state.directory().backend_name().to_string(),
        party_codes: state.party_codes().len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })))
}

/// GET /api/party-codes
/// Current party-code allow-list used by the crawler gateway.
pub async fn get_party_codes(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<Vec<String>>> {
    ResponseJson(ApiResponse::success(state.party_codes().snapshot()))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/party-codes", get(get_party_codes))
}
