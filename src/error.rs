use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Failures raised by a record store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} record with id {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("{collection} record with id {id} already exists")]
    Duplicate { collection: &'static str, id: String },

    #[error("{collection} record with {key} {value} already exists")]
    UniqueViolation {
        collection: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Patch must be a JSON object")]
    InvalidPatch,

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(ref message) => {
                tracing::debug!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            ApiError::NotFound(ref message) => {
                tracing::debug!("Resource not found: {}", message);
                (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone())
            }
            ApiError::Unavailable(ref message) => {
                tracing::warn!("Service unavailable: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    message.clone(),
                )
            }
            ApiError::Internal(ref err) => {
                tracing::error!("Internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

// Store failures are reported to the client verbatim as bad requests.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::warn!("Record store operation failed: {}", err);
        ApiError::BadRequest(err.to_string())
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(&SqlState::UNIQUE_VIOLATION) => {
                let detail = err
                    .as_db_error()
                    .and_then(|db| db.constraint().map(str::to_string))
                    .unwrap_or_else(|| "unique key".to_string());
                StoreError::Constraint(format!("{} already taken", detail))
            }
            Some(&SqlState::CHECK_VIOLATION) | Some(&SqlState::NOT_NULL_VIOLATION) => {
                StoreError::Constraint("Data validation constraint violated".to_string())
            }
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                StoreError::Database("Database connection unavailable".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                StoreError::Database(err.to_string())
            }
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                StoreError::Database("Database connection timeout".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed");
                StoreError::Database("Database service unavailable".to_string())
            }
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                StoreError::Database("Database connection unavailable".to_string())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
