mod common;

use rust_decimal_macros::dec;
use storefront_api::{
    dto::{cart::AddToCartRequest, products::UpdateProductRequest},
    error::AppError,
    services::{cart_service, product_service},
};
use uuid::Uuid;

use common::{create_product, register_and_login, setup_state};

#[tokio::test]
async fn adding_twice_accumulates_and_resyncs_price() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = register_and_login(&state, "dave").await?;
    let product = create_product(&state, &user, dec!(10.00), 10).await?;

    let first = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].price_at_add, dec!(10.00));

    product_service::update_product(
        &state,
        &user,
        product.id,
        UpdateProductRequest {
            price: Some(dec!(12.50)),
            ..Default::default()
        },
    )
    .await?;

    let second = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].quantity, 5);
    assert_eq!(second.items[0].price_at_add, dec!(12.50));
    assert!(second.cart.updated_at >= first.cart.updated_at);
    Ok(())
}

#[tokio::test]
async fn add_rejects_missing_product_excess_and_non_positive() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = register_and_login(&state, "erin").await?;
    let product = create_product(&state, &user, dec!(4.00), 2).await?;

    let missing = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let too_many = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await;
    assert!(matches!(
        too_many,
        Err(AppError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        })
    ));

    let zero = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_positive_update_removes_the_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = register_and_login(&state, "frank").await?;
    let kept = create_product(&state, &user, dec!(1.00), 10).await?;
    let dropped = create_product(&state, &user, dec!(2.00), 10).await?;
    let negative = create_product(&state, &user, dec!(3.00), 10).await?;

    for product in [&kept, &dropped, &negative] {
        cart_service::add_item(
            &state,
            &user,
            AddToCartRequest {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await?;
    }

    let updated = cart_service::update_item_quantity(&state, &user, kept.id, 4)
        .await?
        .data
        .unwrap();
    assert_eq!(updated.items.len(), 3);

    cart_service::update_item_quantity(&state, &user, dropped.id, 0).await?;
    let cart = cart_service::update_item_quantity(&state, &user, negative.id, -2)
        .await?
        .data
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, kept.id);
    assert_eq!(cart.items[0].quantity, 4);

    let over_stock = cart_service::update_item_quantity(&state, &user, kept.id, 11).await;
    assert!(matches!(over_stock, Err(AppError::InsufficientStock { .. })));

    let absent = cart_service::update_item_quantity(&state, &user, dropped.id, 1).await;
    assert!(matches!(absent, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn remove_item_deletes_once() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = register_and_login(&state, "grace").await?;
    let product = create_product(&state, &user, dec!(5.00), 5).await?;

    cart_service::add_item(
        &state,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    cart_service::remove_item(&state, &user, product.id).await?;
    let again = cart_service::remove_item(&state, &user, product.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    Ok(())
}
