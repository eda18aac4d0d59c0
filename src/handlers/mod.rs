// Handlers module
// HTTP handlers for the REST API

pub mod posts;
pub mod profiles;
pub mod users;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tracing::error;

use crate::{db::Database, error::ApiError};

/// Builds the application router; each route group gets the store bundle.
pub fn create_router(database: Arc<Database>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(database.clone())
        .nest("/users", users::router(database.clone()))
        .nest("/profiles", profiles::router(database.clone()))
        .nest("/posts", posts::router(database))
}

/// Health check handler
/// Returns "OK" when the record store answers
pub async fn health_check(State(db): State<Arc<Database>>) -> Result<impl IntoResponse, ApiError> {
    db.health_check().await.map_err(|e| {
        error!("Health check failed: {}", e);
        ApiError::Unavailable(e.to_string())
    })?;

    Ok((StatusCode::OK, "OK"))
}
