use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ORDER_STATUS_PENDING, Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        cart_service::{cart_lines, find_cart, touch},
        order_plan::{CartLine, ProductSnapshot, plan_order},
    },
    state::AppState,
};

/// Turn the caller's cart into a pending order.
///
/// Runs in one transaction: the cart row and every referenced product row
/// are locked (products in ascending id order), the whole cart is validated,
/// and only then are the order, its items, the stock decrements and the
/// cart clearing written. Any failure leaves every table untouched.
pub async fn create_order_from_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let cart = find_cart(&txn, user.user_id(), true).await?;
    let cart_items = cart_lines(&txn, cart.id).await?;
    if cart_items.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut product_ids: Vec<Uuid> = cart_items.iter().map(|item| item.product_id).collect();
    product_ids.sort();
    product_ids.dedup();

    let products: HashMap<Uuid, ProductSnapshot> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .iter()
        .map(|p| (p.id, ProductSnapshot::from(p)))
        .collect();

    let lines: Vec<CartLine> = cart_items
        .iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let plan = plan_order(&lines, &products).inspect_err(|err| {
        tracing::warn!(user_id = %user.user_id(), error = %err, "order rejected");
    })?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id()),
        total_amount: Set(plan.total_amount),
        status: Set(ORDER_STATUS_PENDING.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(plan.lines.len());
    for line in &plan.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price_at_purchase: Set(line.price_at_purchase),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    for decrement in &plan.decrements {
        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(decrement.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(decrement.product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    touch(&txn, cart).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id(),
        total_amount = %order.total_amount,
        lines = items.len(),
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (skip, limit) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id()))
        .order_by_asc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id);

    let total = finder.clone().count(&state.orm).await?;

    let orders = finder
        .offset(skip)
        .limit(limit)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !order_ids.is_empty() {
        let rows = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids))
            .order_by_asc(OrderItemCol::ProductId)
            .all(&state.orm)
            .await?;
        for row in rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItem::from(row));
        }
    }

    let items = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order: Order::from(order),
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(skip, limit, total)),
    ))
}

/// Orders belonging to other users are reported as missing.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id()))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::ProductId)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}
