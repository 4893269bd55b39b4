mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use storefront_api::{
    dto::auth::{LoginRequest, RegisterRequest},
    entity::{carts, users},
    error::AppError,
    middleware::auth::authenticate,
    services::{cart_service, user_service},
};

use common::{PASSWORD, register_and_login, setup_state, unique};

#[tokio::test]
async fn registration_creates_exactly_one_empty_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = register_and_login(&state, "alice").await?;

    let carts = carts::Entity::find()
        .filter(carts::Column::UserId.eq(user.user_id()))
        .count(&state.orm)
        .await?;
    assert_eq!(carts, 1);

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.cart.user_id, user.user_id());
    assert!(cart.items.is_empty());

    let me = user_service::current_user(user.clone()).data.unwrap();
    assert_eq!(me.id, user.user_id());
    Ok(())
}

#[tokio::test]
async fn duplicate_username_or_email_conflicts() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let username = unique("bob");
    let email = format!("{username}@example.com");
    user_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            email: email.clone(),
            password: PASSWORD.into(),
        },
    )
    .await?;

    let same_name = user_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            email: format!("other-{email}"),
            password: PASSWORD.into(),
        },
    )
    .await;
    assert!(matches!(same_name, Err(AppError::Conflict(_))));

    let same_email = user_service::register_user(
        &state,
        RegisterRequest {
            username: unique("bob"),
            email: email.clone(),
            password: PASSWORD.into(),
        },
    )
    .await;
    assert!(matches!(same_email, Err(AppError::Conflict(_))));

    let stored = users::Entity::find()
        .filter(users::Column::Username.eq(username.as_str()))
        .count(&state.orm)
        .await?;
    assert_eq!(stored, 1);
    Ok(())
}

#[tokio::test]
async fn login_failures_share_one_error() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = register_and_login(&state, "carol").await?;

    let wrong_password = user_service::login_user(
        &state,
        LoginRequest {
            username: user.user.username.clone(),
            password: "not-the-password".into(),
        },
    )
    .await
    .unwrap_err();

    let unknown_user = user_service::login_user(
        &state,
        LoginRequest {
            username: unique("nobody"),
            password: PASSWORD.into(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(wrong_password, AppError::Unauthenticated(_)));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    Ok(())
}

#[tokio::test]
async fn token_for_unknown_subject_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let token = state.keys.sign(&unique("ghost"))?;
    let result = authenticate(&state, &token).await;
    assert!(matches!(result, Err(AppError::Unauthenticated(_))));

    let garbage = authenticate(&state, "not.a.token").await;
    assert!(matches!(garbage, Err(AppError::Unauthenticated(_))));
    Ok(())
}
