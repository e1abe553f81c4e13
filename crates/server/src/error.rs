use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::candidate_directory::DirectoryError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Directory(e) => {
                tracing::error!(error = %e, "Candidate directory unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Candidate directory unavailable".to_string(),
                )
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}
