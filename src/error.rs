//!
//! # Error Handling
//!
//! `AppError` is the single error type returned by handlers, extractors and the
//! auth middleware. It implements `actix_web::error::ResponseError`, so every
//! variant turns into an HTTP status with a `{"error": "..."}` JSON body.
//!
//! `From` implementations cover `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `ConfigError`,
//! which lets handlers use `?` directly on those results.
//!
//! The `*_error_handler` functions plug into actix's `JsonConfig`,
//! `QueryConfig` and `PathConfig` so extractor failures share the same body.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::config::ConfigError;

/// Every failure a request can end in.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid, expired or revoked credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but not allowed to touch this object (HTTP 403).
    Forbidden(String),
    /// Malformed request, or a reference to a row that does not exist (HTTP 400).
    BadRequest(String),
    /// The addressed resource does not exist (HTTP 404).
    NotFound(String),
    /// A uniqueness rule would be broken, e.g. an email already registered (HTTP 409).
    Conflict(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// A database operation failed (HTTP 500). The detail is logged, not returned.
    DatabaseError(String),
    /// Input failed field validation (HTTP 422).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let msg = match self {
            AppError::DatabaseError(_) => "Database error",
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
    }
}

/// `RowNotFound` becomes `NotFound`; unique and foreign-key violations become
/// `Conflict` and `BadRequest`; anything else is logged and becomes `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Record already exists".into())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest("Referenced record does not exist".into())
            }
            _ => {
                log::error!("database error: {}", error);
                AppError::DatabaseError(error.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> AppError {
        log::error!("configuration error: {}", error);
        AppError::InternalServerError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig`: malformed or mistyped bodies are 400.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Error handler for `web::QueryConfig`: unknown or malformed parameters are 400.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Error handler for `web::PathConfig`: a path that does not parse names no resource.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (AppError::Unauthorized("Invalid token".into()), 401),
            (AppError::Forbidden("Not the owner".into()), 403),
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::NotFound("Resource not found".into()), 404),
            (AppError::Conflict("Email already registered".into()), 409),
            (AppError::ValidationError("task_name".into()), 422),
            (AppError::InternalServerError("Server error".into()), 500),
            (AppError::DatabaseError("connection reset".into()), 500),
        ];
        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_database_error_detail_is_hidden() {
        let response = AppError::DatabaseError("relation \"tasks\" does not exist".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database error");
    }

    #[actix_rt::test]
    async fn test_error_body_carries_message() {
        let response = AppError::Forbidden("Only the owner may change this project".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Only the owner may change this project");
    }

    #[test]
    fn test_config_error_is_internal() {
        let error: AppError = ConfigError::Invalid {
            key: "JWT_EXPIRATION_HOURS",
            value: "0".to_string(),
        }
        .into();
        assert_eq!(error.error_response().status(), 500);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
