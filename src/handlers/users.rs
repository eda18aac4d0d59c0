// User handlers
// HTTP handlers for user management and subscription lookups

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::{
    db::Database,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidJson},
    models::{ChangeUserRequest, CreateUserRequest, SubscribeRequest, User},
    store::{patch_from, Filter},
};

pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/", get(get_all_users).post(create_user))
        .route("/:id", get(get_user_by_id).patch(update_user).delete(delete_user))
        .route("/:id/subscribeTo", post(subscribe_to))
        .route("/:id/unsubscribeFrom", post(unsubscribe_from))
        .with_state(db)
}

/// GET /users
pub async fn get_all_users(State(db): State<Arc<Database>>) -> ApiResult<impl IntoResponse> {
    info!("Fetching all users");

    let users = db.users.find_many(None).await?;

    info!("Retrieved {} users", users.len());
    Ok((StatusCode::OK, Json(users)))
}

/// GET /users/:id
pub async fn get_user_by_id(
    State(db): State<Arc<Database>>,
    IdPath(user_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Fetching user with id: {}", user_id);

    let user = find_user(&db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok((StatusCode::OK, Json(user)))
}

/// Create a new user
/// POST /users
pub async fn create_user(
    State(db): State<Arc<Database>>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating new user with email: {}", request.email);

    let user = db.users.create(request.into_user()).await?;

    info!("Successfully created user with id: {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(db): State<Arc<Database>>,
    IdPath(user_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting user with id: {}", user_id);

    let user = db.users.delete(&user_id).await?;

    info!("Successfully deleted user with id: {}", user_id);
    Ok((StatusCode::OK, Json(user)))
}

/// PATCH /users/:id
pub async fn update_user(
    State(db): State<Arc<Database>>,
    IdPath(user_id): IdPath,
    ValidJson(request): ValidJson<ChangeUserRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating user with id: {}", user_id);

    let patch = patch_from(&request.normalized())?;
    let user = db.users.change(&user_id, patch).await?;

    info!("Successfully updated user with id: {}", user_id);
    Ok((StatusCode::OK, Json(user)))
}

/// POST /users/:id/subscribeTo
///
/// Read-only: answers with the target user when the target already lists
/// `:id` among its subscriptions, and writes nothing.
pub async fn subscribe_to(
    State(db): State<Arc<Database>>,
    IdPath(user_id): IdPath,
    ValidJson(request): ValidJson<SubscribeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("User {} subscribe check against {}", user_id, request.user_id);

    let user = find_user(&db, &user_id).await?;
    let target = find_user(&db, &request.user_id).await?;

    if user.is_none() {
        return Err(ApiError::not_found("user not found"));
    }

    match target {
        Some(target) if target.is_subscribed_to(&user_id) => Ok((StatusCode::OK, Json(target))),
        _ => Err(ApiError::not_found("subscriber not found")),
    }
}

/// POST /users/:id/unsubscribeFrom
///
/// Writes the target's subscription list back as it is; no id is removed.
pub async fn unsubscribe_from(
    State(db): State<Arc<Database>>,
    IdPath(user_id): IdPath,
    ValidJson(request): ValidJson<SubscribeRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("User {} unsubscribe from {}", user_id, request.user_id);

    let user = find_user(&db, &user_id).await?;
    let target = find_user(&db, &request.user_id).await?;

    if user.is_none() {
        return Err(ApiError::not_found("user not found"));
    }

    let Some(target) = target else {
        return Err(ApiError::not_found("subscribed user not found"));
    };

    let patch = json!({ "subscribedToUserIds": target.subscribed_to_user_ids });
    let updated = db.users.change(&target.id, patch).await?;

    Ok((StatusCode::OK, Json(updated)))
}

async fn find_user(db: &Database, user_id: &str) -> ApiResult<Option<User>> {
    Ok(db.users.find_one(&Filter::id(user_id)).await?)
}
