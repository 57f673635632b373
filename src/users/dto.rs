use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

/// Identity origin of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Provider {
    #[default]
    Local,
    Google,
    Github,
}

/// Wire representation of a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>, // accepted on input, never echoed back
    pub provider: Option<Provider>,
    #[serde(default)]
    pub enable: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: Some(user.id),
            name: user.name,
            email: Some(user.email),
            image: user.image,
            // the stored hash stays on the entity side of the boundary
            password: None,
            provider: Some(user.provider),
            enable: user.enable,
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: Some("Test".to_string()),
            image: None,
            password_hash: Some("$argon2id$fake".to_string()),
            provider: Provider::Local,
            enable: true,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-02 0:00 UTC),
        }
    }

    #[test]
    fn serialization_uses_camel_case_and_hides_password() {
        let mut dto = UserDto::from(sample_user());
        dto.password = Some("super-secret".to_string());

        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("createdAt"));
        assert!(json.contains("updatedAt"));
        assert!(json.contains("\"provider\":\"LOCAL\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn mapper_copies_fields_but_not_the_hash() {
        let user = sample_user();
        let dto = UserDto::from(user.clone());
        assert_eq!(dto.id, Some(user.id));
        assert_eq!(dto.email.as_deref(), Some("test@example.com"));
        assert_eq!(dto.name.as_deref(), Some("Test"));
        assert_eq!(dto.provider, Some(Provider::Local));
        assert!(dto.enable);
        assert_eq!(dto.created_at, Some(user.created_at));
        assert!(dto.password.is_none());
    }

    #[test]
    fn deserializes_sparse_payloads_with_defaults() {
        let dto: UserDto = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert_eq!(dto.email.as_deref(), Some("a@x.com"));
        assert!(!dto.enable);
        assert!(dto.provider.is_none());
        assert!(dto.created_at.is_none());
        assert!(dto.password.is_none());
    }

    #[test]
    fn provider_wire_names_are_uppercase() {
        assert_eq!(
            serde_json::to_string(&Provider::Github).unwrap(),
            "\"GITHUB\""
        );
        let provider: Provider = serde_json::from_str("\"GOOGLE\"").unwrap();
        assert_eq!(provider, Provider::Google);
    }
}
