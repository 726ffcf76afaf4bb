use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use validator::Validate;

use crate::core::config::StripeConfig;
use crate::core::error::{AppError, Result};
use crate::features::orders::dtos::{CartItemDto, CheckoutSessionResponseDto, CreateOrderDto};
use crate::modules::payments::{CheckoutLineItem, CheckoutProvider, CheckoutSessionRequest};

/// Turns a cart into a hosted checkout session
pub struct OrderService {
    provider: Arc<dyn CheckoutProvider>,
    client_url: String,
    currency: String,
    allowed_countries: Vec<String>,
}

impl OrderService {
    pub fn new(provider: Arc<dyn CheckoutProvider>, config: &StripeConfig) -> Self {
        Self {
            provider,
            client_url: config.client_url.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
            allowed_countries: config.allowed_countries.clone(),
        }
    }

    /// Price in minor units, rounded half away from zero
    fn unit_amount(price: Decimal) -> Result<i64> {
        (price * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| AppError::BadRequest(format!("Price {} is out of range", price)))
    }

    fn line_item(item: CartItemDto) -> Result<CheckoutLineItem> {
        Ok(CheckoutLineItem {
            unit_amount: Self::unit_amount(item.regular_price)?,
            name: item.name,
            image: item.image.filter(|url| !url.trim().is_empty()),
            quantity: item.quantity,
        })
    }

    pub async fn checkout(&self, dto: CreateOrderDto) -> Result<CheckoutSessionResponseDto> {
        dto.validate()?;

        let line_items = dto
            .cart
            .into_iter()
            .map(Self::line_item)
            .collect::<Result<Vec<_>>>()?;
        let item_count = line_items.len();

        let request = CheckoutSessionRequest {
            currency: self.currency.clone(),
            line_items,
            success_url: format!("{}/success", self.client_url),
            cancel_url: format!("{}/cancel", self.client_url),
            allowed_countries: self.allowed_countries.clone(),
        };

        let session = self.provider.create_session(request).await?;
        tracing::info!(
            "Checkout session created: id={}, items={}",
            session.get("id").and_then(|v| v.as_str()).unwrap_or("unknown"),
            item_count
        );

        Ok(CheckoutSessionResponseDto {
            stripe_session: session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::shared::test_helpers::{stripe_config, RecordingCheckout};

    fn cart_item(name: &str, price: &str, quantity: i64) -> CartItemDto {
        CartItemDto {
            name: name.to_string(),
            image: Some(format!("http://img/{}.png", name)),
            regular_price: Decimal::from_str(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_unit_amount_rounds_to_minor_units() {
        assert_eq!(OrderService::unit_amount(Decimal::from_str("129.5").unwrap()).unwrap(), 12950);
        assert_eq!(OrderService::unit_amount(Decimal::from_str("0.005").unwrap()).unwrap(), 1);
        assert_eq!(OrderService::unit_amount(Decimal::ZERO).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_builds_session_request() {
        let provider = Arc::new(RecordingCheckout::default());
        let service = OrderService::new(provider.clone(), &stripe_config());

        let response = service
            .checkout(CreateOrderDto {
                cart: vec![cart_item("chair", "19.99", 2), cart_item("lamp", "5", 1)],
            })
            .await
            .unwrap();

        assert_eq!(response.stripe_session["id"], "cs_test_1");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.currency, "php");
        assert_eq!(request.success_url, "http://shop.test/success");
        assert_eq!(request.cancel_url, "http://shop.test/cancel");
        assert_eq!(request.allowed_countries, vec!["PH", "US", "GB"]);
        assert_eq!(request.line_items[0].unit_amount, 1999);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[1].unit_amount, 500);
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_provider() {
        let provider = Arc::new(RecordingCheckout::default());
        let service = OrderService::new(provider.clone(), &stripe_config());

        let err = service
            .checkout(CreateOrderDto { cart: vec![] })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_surfaced() {
        let provider = Arc::new(RecordingCheckout::failing("card declined"));
        let service = OrderService::new(provider, &stripe_config());

        let err = service
            .checkout(CreateOrderDto {
                cart: vec![cart_item("chair", "10", 1)],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::ExternalServiceError(ref msg) if msg.contains("card declined")
        ));
    }
}
