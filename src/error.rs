use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_valid::ValidationRejection;
use domain::DomainError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Error type returned by every handler
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Details are logged, never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Database(db_err) => ApiError::from(db_err),
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected JSON body: {}", rejection.body_text());
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected path parameters: {}", rejection.body_text());
        ApiError::Validation(rejection.body_text())
    }
}

/// Field rules failures from `validator`, or the inner extractor's own rejection
impl<E: Into<ApiError>> From<ValidationRejection<ValidationErrors, E>> for ApiError {
    fn from(rejection: ValidationRejection<ValidationErrors, E>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => {
                warn!("Request failed validation: {}", errors);
                ApiError::Validation(errors.to_string())
            }
            ValidationRejection::Inner(inner) => inner.into(),
        }
    }
}

pub fn error_body(status: StatusCode, error: String, code: &str) -> Response {
    let body = ErrorResponse {
        error,
        code: code.to_string(),
        success: false,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(details) = &self {
            error!("Request failed with internal error: {}", details);
        }
        error_body(self.status_code(), self.client_message(), self.error_code())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
