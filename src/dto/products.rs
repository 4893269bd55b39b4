use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::products::ActiveModel,
    error::{AppError, AppResult},
    models::{Product, to_cents},
};
use sea_orm::Set;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn validated(mut self) -> AppResult<Self> {
        self.name = validate_name(&self.name)?;
        self.price = validate_price(self.price)?;
        validate_stock(self.stock_quantity)?;
        Ok(self)
    }
}

/// Partial update: only the fields present in the body are applied.
/// `description` and `image_url` are cleared by an explicit `null`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

/// Distinguishes `"field": null` (`Some(None)`) from a missing field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateProductRequest {
    /// Validate each present field and copy it onto `active`.
    /// Returns whether anything was set.
    pub fn apply(self, active: &mut ActiveModel) -> AppResult<bool> {
        let mut changed = false;
        if let Some(name) = self.name {
            active.name = Set(validate_name(&name)?);
            changed = true;
        }
        if let Some(description) = self.description {
            active.description = Set(description);
            changed = true;
        }
        if let Some(price) = self.price {
            active.price = Set(validate_price(price)?);
            changed = true;
        }
        if let Some(stock) = self.stock_quantity {
            validate_stock(stock)?;
            active.stock_quantity = Set(stock);
            changed = true;
        }
        if let Some(image_url) = self.image_url {
            active.image_url = Set(image_url);
            changed = true;
        }
        Ok(changed)
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 255 {
        return Err(AppError::Validation(
            "name must be between 1 and 255 characters".into(),
        ));
    }
    Ok(name.to_string())
}

fn validate_price(price: Decimal) -> AppResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    let price = to_cents(price);
    // NUMERIC(10, 2)
    if price >= Decimal::from(100_000_000) {
        return Err(AppError::Validation("price is too large".into()));
    }
    Ok(price)
}

fn validate_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::Validation(
            "stock_quantity must not be negative".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
