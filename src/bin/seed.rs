use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::auth::RegisterRequest,
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    error::AppError,
    services::user_service,
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(pool, &config);

    ensure_user(&state, "demo", "demo@example.com", "demo-password").await?;
    seed_products(&state).await?;

    tracing::info!("seed completed");
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let request = RegisterRequest {
        username: username.into(),
        email: email.into(),
        password: password.into(),
    };
    match user_service::register_user(state, request).await {
        Ok(_) => tracing::info!(username, "registered demo user"),
        Err(AppError::Conflict(_)) => tracing::info!(username, "demo user already present"),
        Err(err) => return Err(anyhow::anyhow!(err)),
    }
    Ok(())
}

async fn seed_products(state: &AppState) -> anyhow::Result<()> {
    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", Decimal::new(5500, 2), 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", Decimal::new(1200, 2), 100),
        ("Rust Sticker Pack", "Decorate your laptop", Decimal::new(500, 2), 200),
        ("E-book: Async Rust", "Learn async Rust patterns", Decimal::new(2500, 2), 75),
    ];

    for (name, description, price, stock) in products {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(name))
            .count(&state.orm)
            .await?
            > 0;
        if exists {
            continue;
        }
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.into()),
            description: Set(Some(description.into())),
            price: Set(price),
            stock_quantity: Set(stock),
            image_url: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
        tracing::info!(name, "seeded product");
    }

    Ok(())
}
