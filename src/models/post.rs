use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::{canonicalize_uuid, validate_uuid, Validate};
use crate::store::Record;

/// Post entity representing a content item written by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
}

impl Record for Post {
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Request structure for creating a new post
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePostRequest {
    pub user_id: String,
    pub title: String,
    pub content: String,
}

/// Request structure for a partial post update
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Query parameters for listing posts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub user_id: Option<String>,
}

impl Post {
    pub fn new(user_id: String, title: String, content: String) -> Self {
        Post {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            content,
        }
    }
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), String> {
        validate_uuid("userId", &self.user_id)?;
        validate_title(&self.title)?;
        validate_content(&self.content)
    }

    fn canonicalize(&mut self) {
        canonicalize_uuid(&mut self.user_id);
    }
}

impl CreatePostRequest {
    pub fn into_post(self) -> Post {
        Post::new(
            self.user_id.trim().to_string(),
            self.title.trim().to_string(),
            self.content.trim().to_string(),
        )
    }
}

impl Validate for ChangePostRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.is_none() && self.content.is_none() {
            return Err("At least one field (title or content) must be provided for update".to_string());
        }

        if let Some(ref title) = self.title {
            validate_title(title)?;
        }

        if let Some(ref content) = self.content {
            validate_content(content)?;
        }

        Ok(())
    }
}

impl ChangePostRequest {
    pub fn normalized(self) -> Self {
        ChangePostRequest {
            title: self.title.map(|t| t.trim().to_string()),
            content: self.content.map(|c| c.trim().to_string()),
        }
    }
}

impl Validate for ListPostsQuery {
    fn validate(&self) -> Result<(), String> {
        match self.user_id {
            Some(ref user_id) => validate_uuid("userId", user_id),
            None => Ok(()),
        }
    }

    fn canonicalize(&mut self) {
        if let Some(ref mut user_id) = self.user_id {
            canonicalize_uuid(user_id);
        }
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    if title.len() > 200 {
        return Err("Title cannot exceed 200 characters".to_string());
    }

    Ok(())
}

fn validate_content(content: &str) -> Result<(), String> {
    if content.len() > 10000 {
        return Err("Content cannot exceed 10000 characters".to_string());
    }

    Ok(())
}
