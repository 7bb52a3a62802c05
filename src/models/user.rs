//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

const MIN_NAME_LEN: usize = 3;

/// Names are stored trimmed, so the minimum length applies to the trimmed value
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::new("name_length")
            .with_message(Cow::Borrowed("name must be at least 3 characters")));
    }
    Ok(())
}

/// User account
///
/// `password_hash` is always an Argon2 PHC string, never plaintext.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a new user, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub pwd: String,
}

/// Update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub pwd: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pwd.is_none()
    }
}

/// User response (without sensitive data)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
