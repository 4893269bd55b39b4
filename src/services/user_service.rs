use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, TokenResponse},
    entity::{
        carts::ActiveModel as CartActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    security::{hash_password, verify_password},
    state::AppState,
};

/// Create a user and their empty cart in one transaction.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.validated()?;

    let txn = state.orm.begin().await?;

    let username_taken = Users::find()
        .filter(UserCol::Username.eq(username.as_str()))
        .count(&txn)
        .await?
        > 0;
    if username_taken {
        return Err(AppError::Conflict("Username already registered".into()));
    }

    let email_taken = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .count(&txn)
        .await?
        > 0;
    if email_taken {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok(ApiResponse::success(
        "User created",
        User::from(user),
        Some(Meta::empty()),
    ))
}

/// Exchange username and password for a signed access token.
///
/// Unknown usernames and wrong passwords produce the same error.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let LoginRequest { username, password } = payload;

    let user = Users::find()
        .filter(UserCol::Username.eq(username.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if verify_password(&password, &u.password_hash) => u,
        _ => {
            tracing::warn!(username = %username, "login rejected");
            return Err(AppError::Unauthenticated(
                "Incorrect username or password".into(),
            ));
        }
    };

    let access_token = state.keys.sign(&user.username)?;

    tracing::info!(user_id = %user.id, "access token issued");

    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse {
            access_token,
            token_type: "bearer".into(),
            expires_in: state.keys.ttl().num_seconds(),
        },
        Some(Meta::empty()),
    ))
}

pub fn current_user(user: AuthUser) -> ApiResponse<User> {
    ApiResponse::success("OK", user.user, Some(Meta::empty()))
}
