use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::validate_non_negative;

fn default_quantity() -> i64 {
    1
}

/// One cart line as sent by the storefront
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "Blue Chair")]
    pub name: String,

    /// Public image URL shown on the payment page
    pub image: Option<String>,

    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = f64, example = 129.5)]
    pub regular_price: Decimal,

    /// Number of units; `amount` is accepted as an alias
    #[serde(alias = "amount", default = "default_quantity")]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    #[schema(example = 2)]
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOrderDto {
    #[validate(length(min = 1, message = "cart must contain at least one item"), nested)]
    pub cart: Vec<CartItemDto>,
}

/// The provider's checkout session, passed through untouched
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponseDto {
    #[schema(value_type = Object)]
    pub stripe_session: serde_json::Value,
}
