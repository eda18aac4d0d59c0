use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::{canonicalize_uuid, validate_uuid, Validate};
use crate::store::Record;

/// Personal details attached to exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub member_type_id: String,
    pub avatar: String,
    pub sex: String,
    pub birthday: i64,
    pub country: String,
    pub street: String,
    pub city: String,
}

impl Record for Profile {
    const COLLECTION: &'static str = "profiles";
    const UNIQUE_KEYS: &'static [&'static str] = &["userId"];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProfileRequest {
    pub user_id: String,
    pub member_type_id: String,
    pub avatar: String,
    pub sex: String,
    pub birthday: i64,
    pub country: String,
    pub street: String,
    pub city: String,
}

/// Everything but the owning user can be changed.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Validate for CreateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        validate_uuid("userId", &self.user_id)?;
        require_text("memberTypeId", &self.member_type_id)?;
        require_text("avatar", &self.avatar)?;
        require_text("sex", &self.sex)?;
        require_text("country", &self.country)?;
        require_text("street", &self.street)?;
        require_text("city", &self.city)
    }

    fn canonicalize(&mut self) {
        canonicalize_uuid(&mut self.user_id);
    }
}

impl CreateProfileRequest {
    pub fn into_profile(self) -> Profile {
        Profile {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.trim().to_string(),
            member_type_id: self.member_type_id.trim().to_string(),
            avatar: self.avatar.trim().to_string(),
            sex: self.sex.trim().to_string(),
            birthday: self.birthday,
            country: self.country.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
        }
    }
}

impl Validate for ChangeProfileRequest {
    fn validate(&self) -> Result<(), String> {
        let texts = [
            ("memberTypeId", &self.member_type_id),
            ("avatar", &self.avatar),
            ("sex", &self.sex),
            ("country", &self.country),
            ("street", &self.street),
            ("city", &self.city),
        ];

        if self.birthday.is_none() && texts.iter().all(|(_, value)| value.is_none()) {
            return Err("At least one field must be provided for update".to_string());
        }

        for (field, value) in texts {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }

        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }

    if value.len() > 255 {
        return Err(format!("{} cannot exceed 255 characters", field));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateProfileRequest {
        serde_json::from_str(
            r#"{
                "userId": "123e4567-e89b-12d3-a456-426614174000",
                "memberTypeId": "basic",
                "avatar": "https://example.com/a.png",
                "sex": "male",
                "birthday": 631152000,
                "country": "Poland",
                "street": " Long St ",
                "city": "Krakow"
            }"#,
        )
        .expect("Failed to deserialize CreateProfileRequest")
    }

    #[test]
    fn test_create_profile_request_validation() {
        assert!(create_request().validate().is_ok());

        let mut bad_user = create_request();
        bad_user.user_id = "not-a-uuid".to_string();
        assert!(bad_user.validate().is_err());

        let mut empty_city = create_request();
        empty_city.city = "".to_string();
        assert_eq!(empty_city.validate().unwrap_err(), "city cannot be empty");
    }

    #[test]
    fn test_into_profile() {
        let profile = create_request().into_profile();

        assert!(Uuid::parse_str(&profile.id).is_ok());
        assert_eq!(profile.user_id, "123e4567-e89b-12d3-a456-426614174000");
        assert_eq!(profile.street, "Long St");
        assert_eq!(profile.birthday, 631152000);
    }

    #[test]
    fn test_change_profile_request_validation() {
        assert!(ChangeProfileRequest::default().validate().is_err());

        let birthday_only = ChangeProfileRequest {
            birthday: Some(0),
            ..Default::default()
        };
        assert!(birthday_only.validate().is_ok());

        let blank_avatar = ChangeProfileRequest {
            avatar: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_avatar.validate().is_err());
    }

    #[test]
    fn test_change_profile_request_cannot_move_user() {
        let result: Result<ChangeProfileRequest, _> =
            serde_json::from_str(r#"{"userId":"123e4567-e89b-12d3-a456-426614174000"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_serialization_is_camel_case() {
        let json = serde_json::to_value(create_request().into_profile()).unwrap();

        assert_eq!(json["memberTypeId"], "basic");
        assert!(json.get("member_type_id").is_none());
    }
}
