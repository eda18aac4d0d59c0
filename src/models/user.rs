use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::{canonicalize_uuid, validate_uuid, Validate};
use crate::store::Record;

/// A registered user and the ids of the users they are subscribed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscribed_to_user_ids: Vec<String>,
}

impl Record for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload of `POST /users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

/// Payload of `PATCH /users/:id`. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Payload of the subscribe/unsubscribe operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubscribeRequest {
    pub user_id: String,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            subscribed_to_user_ids: Vec::new(),
        }
    }

    pub fn is_subscribed_to(&self, user_id: &str) -> bool {
        self.subscribed_to_user_ids.iter().any(|id| id == user_id)
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

impl CreateUserRequest {
    /// Trims the name and lower-cases the email before building the record.
    pub fn into_user(self) -> User {
        User::new(self.name.trim().to_string(), self.email.trim().to_lowercase())
    }
}

impl Validate for ChangeUserRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.email.is_none() {
            return Err("At least one field (name or email) must be provided for update".to_string());
        }

        if let Some(ref name) = self.name {
            validate_name(name)?;
        }

        if let Some(ref email) = self.email {
            validate_email(email)?;
        }

        Ok(())
    }
}

impl ChangeUserRequest {
    pub fn normalized(self) -> Self {
        ChangeUserRequest {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| e.trim().to_lowercase()),
        }
    }
}

impl Validate for SubscribeRequest {
    fn validate(&self) -> Result<(), String> {
        validate_uuid("userId", &self.user_id)
    }

    fn canonicalize(&mut self) {
        canonicalize_uuid(&mut self.user_id);
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > 100 {
        return Err("Name cannot exceed 100 characters".to_string());
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.len() > 255 {
        return Err("Email cannot exceed 255 characters".to_string());
    }

    if !is_valid_email(email.trim()) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Minimal structural check: one `@`, a dotted domain, no exotic characters.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.is_empty() || domain.len() > 253 {
        return false;
    }

    if !domain.contains('.') || domain.contains('@') {
        return false;
    }

    local.chars().all(|c| c.is_alphanumeric() || ".-_+".contains(c))
        && domain.chars().all(|c| c.is_alphanumeric() || ".-".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("John Doe".to_string(), "john@example.com".to_string());

        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.name, "John Doe");
        assert!(user.subscribed_to_user_ids.is_empty());
    }

    #[test]
    fn test_is_subscribed_to() {
        let mut user = User::new("John Doe".to_string(), "john@example.com".to_string());
        user.subscribed_to_user_ids.push("other".to_string());

        assert!(user.is_subscribed_to("other"));
        assert!(!user.is_subscribed_to("someone-else"));
    }

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty_name = CreateUserRequest {
            name: "   ".to_string(),
            email: "john@example.com".to_string(),
        };
        assert_eq!(empty_name.validate().unwrap_err(), "Name cannot be empty");

        let invalid_email = CreateUserRequest {
            name: "John Doe".to_string(),
            email: "invalid-email".to_string(),
        };
        assert_eq!(invalid_email.validate().unwrap_err(), "Invalid email format");
    }

    #[test]
    fn test_into_user_normalizes() {
        let user = CreateUserRequest {
            name: "  Jane  ".to_string(),
            email: " Jane@Example.COM ".to_string(),
        }
        .into_user();

        assert_eq!(user.name, "Jane");
        assert_eq!(user.email, "jane@example.com");
    }

    #[test]
    fn test_change_user_request_validation() {
        let name_only = ChangeUserRequest {
            name: Some("Jane Doe".to_string()),
            email: None,
        };
        assert!(name_only.validate().is_ok());

        assert!(ChangeUserRequest::default().validate().is_err());

        let bad_email = ChangeUserRequest {
            name: None,
            email: Some("nope".to_string()),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_change_user_request_serializes_only_present_fields() {
        let request = ChangeUserRequest {
            name: Some(" Jane ".to_string()),
            email: None,
        }
        .normalized();

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"name":"Jane"}"#);
    }

    #[test]
    fn test_subscribe_request_requires_uuid() {
        let request: SubscribeRequest =
            serde_json::from_str(r#"{"userId":"123e4567-e89b-12d3-a456-426614174000"}"#).unwrap();
        assert!(request.validate().is_ok());

        let request = SubscribeRequest {
            user_id: "abc".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("user+tag@example.org"));

        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_user_serialization_is_camel_case() {
        let user = User {
            id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            subscribed_to_user_ids: vec!["987fcdeb-51a2-43d1-9f12-345678901234".to_string()],
        };

        let json = serde_json::to_string(&user).expect("Failed to serialize user");
        let expected = r#"{"id":"123e4567-e89b-12d3-a456-426614174000","name":"John Doe","email":"john@example.com","subscribedToUserIds":["987fcdeb-51a2-43d1-9f12-345678901234"]}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_create_request_rejects_unknown_fields() {
        let result: Result<CreateUserRequest, _> =
            serde_json::from_str(r#"{"name":"Jane","email":"jane@example.com","admin":true}"#);
        assert!(result.is_err());
    }
}
