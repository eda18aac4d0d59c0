// Request extractors
// Decode and validate path, query and body input before a handler runs

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// Shape and value constraints of an incoming payload.
///
/// Failures are reported as a human-readable message and surface as `400`.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;

    /// Rewrites id fields into their stored spelling. Runs after `validate`.
    fn canonicalize(&mut self) {}
}

/// Lower-case hyphenated form of any spelling `Uuid::parse_str` accepts.
pub fn canonical_uuid(value: &str) -> Option<String> {
    Uuid::parse_str(value.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

pub fn validate_uuid(field: &str, value: &str) -> Result<(), String> {
    match canonical_uuid(value) {
        Some(_) => Ok(()),
        None => Err(format!("{} must be a valid UUID", field)),
    }
}

/// Replaces a validated UUID field with its canonical form in place.
pub fn canonicalize_uuid(value: &mut String) {
    if let Some(id) = canonical_uuid(value) {
        *value = id;
    }
}

/// JSON body that has been deserialized and passed `Validate`.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        value.validate().map_err(ApiError::BadRequest)?;
        value.canonicalize();
        Ok(ValidJson(value))
    }
}

/// Query string that has been deserialized and passed `Validate`.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(mut value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        value.validate().map_err(ApiError::BadRequest)?;
        value.canonicalize();
        Ok(ValidQuery(value))
    }
}

/// The `:id` path segment of entity routes, in canonical UUID form.
#[derive(Debug)]
pub struct IdPath(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        let id = canonical_uuid(&id)
            .ok_or_else(|| ApiError::bad_request("id must be a valid UUID"))?;
        Ok(IdPath(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatePostRequest, ListPostsQuery};
    use axum::body::Body;
    use axum::http;
    use axum::http::header::CONTENT_TYPE;

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/posts")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "123e4567-e89b-12d3-a456-426614174000").is_ok());
        assert_eq!(validate_uuid("userId", "42").unwrap_err(), "userId must be a valid UUID");
    }

    #[test]
    fn test_canonical_uuid_folds_spellings() {
        let canonical = "123e4567-e89b-12d3-a456-426614174000";
        for spelling in [
            canonical,
            "123E4567-E89B-12D3-A456-426614174000",
            "123e4567e89b12d3a456426614174000",
            "{123e4567-e89b-12d3-a456-426614174000}",
            "urn:uuid:123e4567-e89b-12d3-a456-426614174000",
            "  123e4567-e89b-12d3-a456-426614174000 ",
        ] {
            assert_eq!(canonical_uuid(spelling).as_deref(), Some(canonical), "{}", spelling);
        }
        assert_eq!(canonical_uuid("not-a-uuid"), None);
    }

    #[tokio::test]
    async fn test_id_path_is_canonical() {
        let app = axum::Router::new().route(
            "/users/:id",
            axum::routing::get(|IdPath(id): IdPath| async move { id }),
        );
        let request = http::Request::builder()
            .uri("/users/%20123E4567E89B12D3A456426614174000")
            .body(Body::empty())
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"123e4567-e89b-12d3-a456-426614174000");
    }

    #[tokio::test]
    async fn test_valid_json_canonicalizes_ids() {
        let request = json_request(
            r#"{"userId":"{987FCDEB-51A2-43D1-9F12-345678901234}","title":"Hi","content":"There"}"#,
        );

        let ValidJson(payload) = ValidJson::<CreatePostRequest>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(payload.user_id, "987fcdeb-51a2-43d1-9f12-345678901234");
    }

    #[tokio::test]
    async fn test_valid_query_canonicalizes_ids() {
        let mut parts = http::Request::builder()
            .uri("/posts?userId=987FCDEB51A243D19F12345678901234")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let ValidQuery(query) = ValidQuery::<ListPostsQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(query.user_id.as_deref(), Some("987fcdeb-51a2-43d1-9f12-345678901234"));
    }

    #[tokio::test]
    async fn test_valid_json_accepts_valid_payload() {
        let request = json_request(
            r#"{"userId":"123e4567-e89b-12d3-a456-426614174000","title":"Hi","content":"There"}"#,
        );

        let ValidJson(payload) = ValidJson::<CreatePostRequest>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(payload.title, "Hi");
    }

    #[tokio::test]
    async fn test_valid_json_runs_validation() {
        let request = json_request(r#"{"userId":"nope","title":"Hi","content":"There"}"#);

        let err = ValidJson::<CreatePostRequest>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "userId must be a valid UUID"));
    }

    #[tokio::test]
    async fn test_valid_json_maps_syntax_errors_to_bad_request() {
        let request = json_request("{not json");

        let err = ValidJson::<CreatePostRequest>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_valid_json_requires_content_type() {
        let request = http::Request::builder()
            .method("POST")
            .uri("/posts")
            .body(Body::from("{}"))
            .unwrap();

        let err = ValidJson::<CreatePostRequest>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
