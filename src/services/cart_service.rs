use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartWithItems},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartWithItems>> {
    let cart = find_cart(&state.orm, user.user_id(), false).await?;
    let data = with_items(&state.orm, cart).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Add `quantity` of a product, accumulating onto an existing line.
///
/// The line's price snapshot is re-synced to the current product price.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartWithItems>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;
    let cart = find_cart(&txn, user.user_id(), true).await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    ensure_stock(&product, payload.quantity)?;

    let line = match find_line(&txn, cart.id, payload.product_id).await? {
        Some(existing) => {
            let quantity = existing
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(|| AppError::Validation("quantity is too large".into()))?;
            let mut active: CartItemActive = existing.into();
            active.quantity = Set(quantity);
            active.price_at_add = Set(product.price);
            active.update(&txn).await?
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                price_at_add: Set(product.price),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    let cart = touch(&txn, cart).await?;
    let data = with_items(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id(),
        product_id = %line.product_id,
        quantity = line.quantity,
        "cart item added"
    );

    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Set a line's quantity. Zero or less removes the line.
pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartWithItems>> {
    let txn = state.orm.begin().await?;
    let cart = find_cart(&txn, user.user_id(), true).await?;

    let line = find_line(&txn, cart.id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not in cart".into()))?;

    if quantity <= 0 {
        line.delete(&txn).await?;
        tracing::info!(user_id = %user.user_id(), product_id = %product_id, "cart item removed");
    } else {
        let product = Products::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;
        ensure_stock(&product, quantity)?;

        let mut active: CartItemActive = line.into();
        active.quantity = Set(quantity);
        active.price_at_add = Set(product.price);
        active.update(&txn).await?;
        tracing::info!(
            user_id = %user.user_id(),
            product_id = %product_id,
            quantity,
            "cart item updated"
        );
    }

    let cart = touch(&txn, cart).await?;
    let data = with_items(&txn, cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn remove_item(state: &AppState, user: &AuthUser, product_id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    let cart = find_cart(&txn, user.user_id(), true).await?;

    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart.id))
                .add(CartItemCol::ProductId.eq(product_id)),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not in cart".into()));
    }

    touch(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id(), product_id = %product_id, "cart item removed");
    Ok(())
}

/// Load the user's cart, optionally holding its row lock for the
/// rest of the transaction so concurrent edits of one cart serialize.
pub(crate) async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    lock: bool,
) -> AppResult<CartModel> {
    let mut finder = Carts::find().filter(CartCol::UserId.eq(user_id));
    if lock {
        finder = finder.lock(LockType::Update);
    }
    finder
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found for this user".into()))
}

/// All lines of a cart, oldest first.
pub(crate) async fn cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<CartItemModel>> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .all(conn)
        .await?;
    Ok(lines)
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<CartItemModel>> {
    let line = CartItems::find()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart_id))
                .add(CartItemCol::ProductId.eq(product_id)),
        )
        .one(conn)
        .await?;
    Ok(line)
}

fn ensure_stock(product: &ProductModel, requested: i32) -> AppResult<()> {
    if product.stock_quantity < requested {
        tracing::warn!(
            product_id = %product.id,
            available = product.stock_quantity,
            requested,
            "insufficient stock"
        );
        return Err(AppError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock_quantity,
            requested,
        });
    }
    Ok(())
}

pub(crate) async fn touch<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<CartModel> {
    let mut active: CartActive = cart.into();
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn with_items<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<CartWithItems> {
    let items = cart_lines(conn, cart.id)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();
    Ok(CartWithItems {
        cart: Cart::from(cart),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(stock: i32) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: "Rust Sticker Pack".into(),
            description: None,
            price: dec!(5.00),
            stock_quantity: stock,
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn stock_check_allows_exact_amount() {
        assert!(ensure_stock(&product(3), 3).is_ok());
    }

    #[test]
    fn stock_check_reports_available_and_requested() {
        match ensure_stock(&product(2), 3) {
            Err(AppError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Rust Sticker Pack");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
