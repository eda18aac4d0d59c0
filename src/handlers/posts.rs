// Post handlers
// HTTP handlers for post management operations

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    db::Database,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidJson, ValidQuery},
    models::{ChangePostRequest, CreatePostRequest, ListPostsQuery},
    store::{patch_from, Filter},
};

pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/", get(get_all_posts).post(create_post))
        .route("/:id", get(get_post_by_id).patch(update_post).delete(delete_post))
        .with_state(db)
}

/// Get all posts, optionally filtered by author
/// GET /posts?userId=<id>
pub async fn get_all_posts(
    State(db): State<Arc<Database>>,
    ValidQuery(params): ValidQuery<ListPostsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.user_id.map(|user_id| Filter::equals("userId", user_id));

    let posts = db.posts.find_many(filter.as_ref()).await?;

    info!("Retrieved {} posts", posts.len());
    Ok((StatusCode::OK, Json(posts)))
}

/// GET /posts/:id
pub async fn get_post_by_id(
    State(db): State<Arc<Database>>,
    IdPath(post_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Fetching post with id: {}", post_id);

    let post = db
        .posts
        .find_one(&Filter::id(post_id))
        .await?
        .ok_or_else(|| ApiError::not_found("post not found"))?;

    Ok((StatusCode::OK, Json(post)))
}

/// Create a new post
/// POST /posts
pub async fn create_post(
    State(db): State<Arc<Database>>,
    ValidJson(request): ValidJson<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating new post for user_id: {} with title: {}", request.user_id, request.title);

    let post = db.posts.create(request.into_post()).await?;

    info!("Successfully created post with id: {}", post.id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(db): State<Arc<Database>>,
    IdPath(post_id): IdPath,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting post with id: {}", post_id);

    let post = db.posts.delete(&post_id).await?;

    info!("Successfully deleted post with id: {}", post_id);
    Ok((StatusCode::OK, Json(post)))
}

/// PATCH /posts/:id
pub async fn update_post(
    State(db): State<Arc<Database>>,
    IdPath(post_id): IdPath,
    ValidJson(request): ValidJson<ChangePostRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating post with id: {}", post_id);

    let patch = patch_from(&request.normalized())?;
    let post = db.posts.change(&post_id, patch).await?;

    info!("Successfully updated post with id: {}", post_id);
    Ok((StatusCode::OK, Json(post)))
}
