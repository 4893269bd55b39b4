use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::users::{Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

/// The caller behind a valid bearer token, resolved to a stored user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(AppError::credentials)?
        .to_str()
        .map_err(|_| AppError::credentials())?;

    let (scheme, token) = value.split_once(' ').ok_or_else(AppError::credentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::credentials());
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::credentials());
    }
    Ok(token)
}

/// Verify `token` and load the user named by its subject.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = state.keys.verify(token)?;

    let user = Users::find()
        .filter(UserCol::Username.eq(claims.sub.as_str()))
        .one(&state.orm)
        .await?;

    match user {
        Some(user) => Ok(AuthUser { user: user.into() }),
        None => {
            tracing::warn!(username = %claims.sub, "token subject does not resolve to a user");
            Err(AppError::credentials())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        authenticate(state, token).await
    }
}
