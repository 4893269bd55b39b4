use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trim and check the fields, returning the normalized request.
    pub fn validated(self) -> AppResult<Self> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        let len = username.chars().count();
        if !(3..=50).contains(&len) {
            return Err(AppError::Validation(
                "username must be between 3 and 50 characters".into(),
            ));
        }
        if !is_plausible_email(&email) {
            return Err(AppError::Validation("email is not valid".into()));
        }
        if self.password.chars().count() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > 255 || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// OAuth2 password-grant style form body.
#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
