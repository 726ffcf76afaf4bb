use async_trait::async_trait;

use crate::core::error::Result;

/// One purchasable line in a checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub image: Option<String>,
    /// Price in the currency's minor unit (e.g. centavos)
    pub unit_amount: i64,
    pub quantity: i64,
}

/// Everything the provider needs to open a hosted payment page
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub allowed_countries: Vec<String>,
}

/// Hosted checkout provider
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a checkout session and return the provider's session object as-is
    async fn create_session(&self, request: CheckoutSessionRequest) -> Result<serde_json::Value>;
}
