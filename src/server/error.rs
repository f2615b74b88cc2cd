use crate::core::CalcError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Calc(#[from] CalcError),
    #[error("{0}")]
    BadRequest(String),
}

/// `{"status": "error", "error": ...}`, the shape every form expects.
#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Calc(CalcError::Transport(_) | CalcError::Backend(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Calc(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(ErrorBody {
            status: "error",
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
