use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        cart::{AddToCartRequest, CartWithItems},
        orders::{OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Cart, CartItem, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::me,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        orders::create_order,
        orders::list_orders,
        orders::get_order
    ),
    components(
        schemas(
            User,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            CreateProductRequest,
            UpdateProductRequest,
            AddToCartRequest,
            CartWithItems,
            OrderList,
            OrderWithItems,
            ProductList,
            params::Pagination,
            health::HealthData,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartWithItems>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<TokenResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health probes"),
        (name = "Users", description = "Registration, login and the current user"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "The caller's cart"),
        (name = "Orders", description = "Order placement and history"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
