//! Validation pass of order placement.
//!
//! Given the cart lines and the (locked) products they reference, decide
//! whether the whole cart can be bought and what must be written if so.
//! Nothing here touches the database; the caller applies an [`OrderPlan`]
//! inside the same transaction that produced its inputs.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    entity::products::Model as ProductModel,
    error::{AppError, AppResult},
    models::to_cents,
};

/// Exclusive upper bound of `orders.total_amount` (`NUMERIC(19, 2)`).
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(1569325056, 23283064, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

impl From<&ProductModel> for ProductSnapshot {
    fn from(model: &ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            price: model.price,
            stock_quantity: model.stock_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    /// Ascending by product id.
    pub lines: Vec<PlannedLine>,
    pub decrements: Vec<StockDecrement>,
    pub total_amount: Decimal,
}

/// Check every line against its product and build the writes.
///
/// Lines for the same product are merged. Products are visited in
/// ascending id order; the first failing line aborts the whole plan.
pub fn plan_order(
    lines: &[CartLine],
    products: &HashMap<Uuid, ProductSnapshot>,
) -> AppResult<OrderPlan> {
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut requested: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "Cart has invalid quantity for product {}",
                line.product_id
            )));
        }
        let entry = requested.entry(line.product_id).or_insert(0);
        *entry = entry
            .checked_add(line.quantity)
            .ok_or_else(|| AppError::Validation("quantity is too large".into()))?;
    }

    let mut plan = OrderPlan {
        lines: Vec::with_capacity(requested.len()),
        decrements: Vec::with_capacity(requested.len()),
        total_amount: Decimal::ZERO,
    };

    for (product_id, quantity) in requested {
        let product = products.get(&product_id).ok_or_else(|| {
            AppError::NotFound(format!("Product with ID {product_id} not found"))
        })?;

        if product.stock_quantity < quantity {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        plan.total_amount += product.price * Decimal::from(quantity);
        plan.lines.push(PlannedLine {
            product_id,
            quantity,
            price_at_purchase: product.price,
        });
        plan.decrements.push(StockDecrement {
            product_id,
            quantity,
        });
    }

    plan.total_amount = to_cents(plan.total_amount);
    if plan.total_amount >= MAX_ORDER_TOTAL {
        return Err(AppError::Validation(
            "order total exceeds the maximum supported amount".into(),
        ));
    }
    Ok(plan)
}
