// Profile handlers
// HTTP handlers for profile management operations

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    db::Database,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidJson},
    models::{ChangeProfileRequest, CreateProfileRequest},
    store::{patch_from, Filter},
};

pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/", get(get_all_profiles).post(create_profile))
        .route("/:id", get(get_profile_by_id).patch(update_profile).delete(delete_profile))
        .with_state(db)
}

/// GET /profiles
pub async fn get_all_profiles(State(db): State<Arc<Database>>) -> ApiResult<impl IntoResponse> {
    let profiles = db.profiles.find_many(None).await?;

    info!("Retrieved {} profiles", profiles.len());
    Ok((StatusCode::OK, Json(profiles)))
}

/// GET /profiles/:id
pub async fn get_profile_by_id(
    State(db): State<Arc<Database>>,
    IdPath(profile_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Fetching profile with id: {}", profile_id);

    let profile = db
        .profiles
        .find_one(&Filter::id(profile_id))
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    Ok((StatusCode::OK, Json(profile)))
}

/// Create a profile for a user that has none yet
/// POST /profiles
///
/// The store's unique key on `userId` rejects a concurrent duplicate that
/// slips past the lookup below.
pub async fn create_profile(
    State(db): State<Arc<Database>>,
    ValidJson(request): ValidJson<CreateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating profile for user_id: {}", request.user_id);

    let existing = db
        .profiles
        .find_one(&Filter::equals("userId", request.user_id.as_str()))
        .await?;

    let member_type = db
        .member_types
        .find_one(&Filter::id(request.member_type_id.trim()))
        .await?;

    if existing.is_some() {
        warn!("User {} already has a profile", request.user_id);
        return Err(ApiError::bad_request("user already has a profile"));
    }

    if member_type.is_none() {
        warn!("Member type {} does not exist", request.member_type_id);
        return Err(ApiError::bad_request("member type does not exist"));
    }

    let profile = db.profiles.create(request.into_profile()).await?;

    info!("Successfully created profile with id: {}", profile.id);
    Ok((StatusCode::CREATED, Json(profile)))
}

/// DELETE /profiles/:id
pub async fn delete_profile(
    State(db): State<Arc<Database>>,
    IdPath(profile_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting profile with id: {}", profile_id);

    let profile = db.profiles.delete(&profile_id).await?;

    info!("Successfully deleted profile with id: {}", profile_id);
    Ok((StatusCode::OK, Json(profile)))
}

/// PATCH /profiles/:id
pub async fn update_profile(
    State(db): State<Arc<Database>>,
    IdPath(profile_id): IdPath,
    ValidJson(request): ValidJson<ChangeProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating profile with id: {}", profile_id);

    let patch = patch_from(&request)?;
    let profile = db.profiles.change(&profile_id, patch).await?;

    info!("Successfully updated profile with id: {}", profile_id);
    Ok((StatusCode::OK, Json(profile)))
}
