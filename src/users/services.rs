use std::sync::Arc;

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::dto::UserDto;
use crate::users::repo::UserStore;
use crate::users::repo_types::NewUser;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Business rules over the user store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    fn parse_user_id(user_id: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(user_id).map_err(|_| {
            warn!(%user_id, "malformed user id");
            ApiError::InvalidArgument("Invalid user id".into())
        })
    }

    pub async fn create_user(&self, dto: UserDto) -> Result<UserDto, ApiError> {
        let email = dto
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default();
        if email.is_empty() {
            warn!("create user without email");
            return Err(ApiError::InvalidArgument("Email is required".into()));
        }
        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(ApiError::InvalidArgument("Invalid email".into()));
        }
        if self.store.exists_by_email(&email).await? {
            warn!(%email, "email already registered");
            return Err(ApiError::InvalidArgument(
                "User with given email already exists".into(),
            ));
        }

        let password_hash = match dto.password.as_deref() {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };

        // A concurrent create of the same email loses against the unique
        // constraint and surfaces as DuplicateEmail here.
        let user = self
            .store
            .insert(NewUser {
                email,
                name: dto.name,
                image: dto.image,
                password_hash,
                provider: dto.provider.unwrap_or_default(),
                enable: dto.enable,
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserDto, ApiError> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found with given email".into()))?;
        Ok(user.into())
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<UserDto, ApiError> {
        let id = Self::parse_user_id(user_id)?;
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found with given id".into()))?;
        Ok(user.into())
    }

    pub async fn update_user(&self, dto: UserDto, user_id: &str) -> Result<UserDto, ApiError> {
        let id = Self::parse_user_id(user_id)?;
        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found with given id".into()))?;

        // email stays as-is, whatever the dto carries
        if let Some(name) = dto.name {
            user.name = Some(name);
        }
        if let Some(image) = dto.image {
            user.image = Some(image);
        }
        if let Some(provider) = dto.provider {
            user.provider = provider;
        }
        if let Some(plain) = dto.password.as_deref() {
            user.password_hash = Some(hash_password(plain)?);
        }
        // enable is overwritten unconditionally; an omitted field disables
        user.enable = dto.enable;
        user.updated_at = OffsetDateTime::now_utc();

        let user = self.store.update(&user).await?;
        info!(user_id = %user.id, "user updated");
        Ok(user.into())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        let id = Self::parse_user_id(user_id)?;
        if !self.store.delete(id).await? {
            return Err(ApiError::NotFound("User not found with given id".into()));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserDto>, ApiError> {
        let users = self.store.find_all().await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        let msg = err.to_string();
        assert!(!msg.is_empty());
    }
}
