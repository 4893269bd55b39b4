#![allow(dead_code)]

use std::time::Duration;

use rust_decimal::Decimal;
use storefront_api::{
    config::{AppConfig, DbConfig, Service, token_ttl},
    db::{create_pool, run_migrations},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        products::CreateProductRequest,
    },
    middleware::auth::{AuthUser, authenticate},
    models::Product,
    services::{product_service, user_service},
    state::AppState,
};
use uuid::Uuid;

pub const PASSWORD: &str = "s3cret-password";

/// Connect to the test database, or `None` when none is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let url = match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let config = AppConfig {
        database: DbConfig {
            url,
            max_connections: 5,
            connect_max_retries: 1,
            connect_retry_delay: Duration::ZERO,
        },
        jwt_secret: "integration-test-secret".into(),
        access_token_ttl: token_ttl(30)?,
        host: "127.0.0.1".into(),
        port: 0,
        services: Service::ALL.to_vec(),
    };

    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    Ok(Some(AppState::new(pool, &config)))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..10])
}

/// Register a fresh user, log in, and resolve the token the way a request would.
pub async fn register_and_login(state: &AppState, prefix: &str) -> anyhow::Result<AuthUser> {
    let username = unique(prefix);
    user_service::register_user(
        state,
        RegisterRequest {
            username: username.clone(),
            email: format!("{username}@example.com"),
            password: PASSWORD.into(),
        },
    )
    .await?;

    let token = user_service::login_user(
        state,
        LoginRequest {
            username,
            password: PASSWORD.into(),
        },
    )
    .await?
    .data
    .expect("token data")
    .access_token;

    Ok(authenticate(state, &token).await?)
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<Product> {
    let product = product_service::create_product(
        state,
        user,
        CreateProductRequest {
            name: unique("product"),
            description: Some("integration test product".into()),
            price,
            stock_quantity: stock,
            image_url: None,
        },
    )
    .await?
    .data
    .expect("product data");
    Ok(product)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = product_service::get_product(state, product_id)
        .await?
        .data
        .expect("product data");
    Ok(product.stock_quantity)
}
