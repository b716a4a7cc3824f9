use actix_web::error::{BlockingError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("CSRF token mismatch.")]
    CsrfMismatch,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upload(String),

    #[error("storage failure")]
    Store(#[source] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => AppError::NotFound("record"),
            StoreError::UniqueViolation(constraint) => {
                AppError::Conflict(format!("duplicate value violates `{}`", constraint))
            }
            StoreError::ForeignKeyViolation => {
                AppError::Conflict("referenced record does not exist".to_string())
            }
            other => AppError::Store(other),
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(_: BlockingError) -> Self {
        AppError::Internal("blocking task was canceled".to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Malformed JSON bodies answer like any other invalid form. Transport
/// problems such as an oversized or non-JSON payload keep actix's response.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(source) => {
            let mut errors = ValidationErrors::default();
            errors.add("body", source.to_string());
            AppError::Validation(errors).into()
        }
        other => other.into(),
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let mut errors = ValidationErrors::default();
    errors.add("query", err.to_string());
    AppError::Validation(errors).into()
}

/// "Page expired", returned when the CSRF token is missing or wrong.
pub const PAGE_EXPIRED: u16 = 419;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::CsrfMismatch => StatusCode::from_u16(PAGE_EXPIRED).unwrap_or(StatusCode::FORBIDDEN),
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => json!({
                "message": self.to_string(),
                "errors": errors,
            }),
            AppError::Store(source) => {
                error!("store failure: {} ({:?})", source, source);
                json!({ "message": "Server Error" })
            }
            AppError::Internal(reason) => {
                error!("internal failure: {}", reason);
                json!({ "message": "Server Error" })
            }
            _ => json!({ "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
