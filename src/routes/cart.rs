use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartWithItems, UpdateQuantityQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::health,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/{product_id}", put(update_item).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "The caller's cart with its items", body = ApiResponse<CartWithItems>),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Cart not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartWithItems>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added; quantity accumulates", body = ApiResponse<CartWithItems>),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Product or cart not found"),
        (status = 422, description = "Quantity must be positive")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartWithItems>>> {
    let resp = cart_service::add_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        UpdateQuantityQuery
    ),
    responses(
        (status = 200, description = "Quantity set, or line removed when quantity <= 0", body = ApiResponse<CartWithItems>),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Product not in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<UpdateQuantityQuery>,
) -> AppResult<Json<ApiResponse<CartWithItems>>> {
    let resp =
        cart_service::update_item_quantity(&state, &user, product_id, query.quantity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Product not in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cart_service::remove_item(&state, &user, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
