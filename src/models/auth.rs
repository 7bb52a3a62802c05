//! Authentication-related models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub pwd: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Identity as seen by the token, not the store
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub name: String,
}
