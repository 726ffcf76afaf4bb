//! Stripe Checkout Sessions over the REST API
//!
//! Stripe expects `application/x-www-form-urlencoded` bodies with bracketed
//! keys for nested objects and arrays.

use async_trait::async_trait;
use serde::Deserialize;

use super::checkout::{CheckoutProvider, CheckoutSessionRequest};
use crate::core::config::StripeConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: String,
}

pub struct StripeClient {
    secret_key: String,
    api_base: String,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Flatten a session request into Stripe's bracketed form fields
    pub fn encode_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (i, item) in request.line_items.iter().enumerate() {
            let price = format!("line_items[{}][price_data]", i);
            form.push((format!("{}[currency]", price), request.currency.clone()));
            form.push((format!("{}[product_data][name]", price), item.name.clone()));
            if let Some(image) = &item.image {
                form.push((format!("{}[product_data][images][0]", price), image.clone()));
            }
            form.push((format!("{}[unit_amount]", price), item.unit_amount.to_string()));
            form.push((
                format!("line_items[{}][quantity]", i),
                item.quantity.to_string(),
            ));
        }

        for (i, country) in request.allowed_countries.iter().enumerate() {
            form.push((
                format!("shipping_address_collection[allowed_countries][{}]", i),
                country.clone(),
            ));
        }

        form
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_session(&self, request: CheckoutSessionRequest) -> Result<serde_json::Value> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let form = Self::encode_form(&request);

        tracing::debug!(
            "Creating Stripe checkout session with {} line items",
            request.line_items.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Stripe: {}", e);
                AppError::ExternalServiceError(format!("Failed to create checkout session: {}", e))
            })?;

        let status = response.status();

        if status.is_success() {
            let session = response.json::<serde_json::Value>().await.map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to parse Stripe response: {}", e))
            })?;
            tracing::info!(
                "Created Stripe checkout session {}",
                session.get("id").and_then(|v| v.as_str()).unwrap_or("-")
            );
            return Ok(session);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        tracing::error!("Stripe rejected checkout session: {} - {}", status, message);
        Err(AppError::ExternalServiceError(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Form, Json, Router,
    };
    use serde_json::json;

    use crate::modules::payments::CheckoutLineItem;
    use crate::shared::test_helpers::stripe_config;

    /// Serve `router` on an ephemeral port and return a client pointed at it
    async fn client_for(router: Router) -> StripeClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        StripeClient::new(&StripeConfig {
            api_base: format!("http://{}", addr),
            ..stripe_config()
        })
    }

    fn one_item_request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            currency: "php".to_string(),
            line_items: vec![CheckoutLineItem {
                name: "Chair".to_string(),
                image: None,
                unit_amount: 1000,
                quantity: 1,
            }],
            success_url: "http://shop/success".to_string(),
            cancel_url: "http://shop/cancel".to_string(),
            allowed_countries: vec!["PH".to_string()],
        }
    }

    fn lookup<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_encode_form_nests_line_items_and_countries() {
        let request = CheckoutSessionRequest {
            currency: "php".to_string(),
            line_items: vec![
                CheckoutLineItem {
                    name: "Blue Chair".to_string(),
                    image: Some("http://img/blue.png".to_string()),
                    unit_amount: 129_900,
                    quantity: 2,
                },
                CheckoutLineItem {
                    name: "Lamp".to_string(),
                    image: None,
                    unit_amount: 50,
                    quantity: 1,
                },
            ],
            success_url: "http://shop/success".to_string(),
            cancel_url: "http://shop/cancel".to_string(),
            allowed_countries: vec!["PH".to_string(), "US".to_string()],
        };

        let form = StripeClient::encode_form(&request);

        assert_eq!(lookup(&form, "mode"), Some("payment"));
        assert_eq!(lookup(&form, "payment_method_types[0]"), Some("card"));
        assert_eq!(
            lookup(&form, "line_items[0][price_data][product_data][name]"),
            Some("Blue Chair")
        );
        assert_eq!(
            lookup(&form, "line_items[0][price_data][product_data][images][0]"),
            Some("http://img/blue.png")
        );
        assert_eq!(
            lookup(&form, "line_items[0][price_data][unit_amount]"),
            Some("129900")
        );
        assert_eq!(lookup(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            lookup(&form, "line_items[1][price_data][product_data][images][0]"),
            None
        );
        assert_eq!(
            lookup(&form, "shipping_address_collection[allowed_countries][1]"),
            Some("US")
        );
    }

    #[tokio::test]
    async fn test_create_session_posts_form_with_secret_key() {
        let router = Router::new().route(
            "/v1/checkout/sessions",
            post(
                |headers: HeaderMap, Form(form): Form<Vec<(String, String)>>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({
                        "id": "cs_live_1",
                        "auth": auth,
                        "currency": lookup(&form, "line_items[0][price_data][currency]"),
                    }))
                },
            ),
        );
        let client = client_for(router).await;

        let session = client.create_session(one_item_request()).await.unwrap();

        assert_eq!(session["id"], "cs_live_1");
        assert_eq!(session["auth"], "Bearer sk_test_123");
        assert_eq!(session["currency"], "php");
    }

    #[tokio::test]
    async fn test_create_session_surfaces_stripe_error_message() {
        let router = Router::new().route(
            "/v1/checkout/sessions",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": "Invalid currency: xyz"}})),
                )
            }),
        );
        let client = client_for(router).await;

        let err = client.create_session(one_item_request()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::ExternalServiceError(ref msg) if msg == "Invalid currency: xyz"
        ));
    }
}
