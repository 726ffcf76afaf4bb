use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::orders::dtos::{CheckoutSessionResponseDto, CreateOrderDto};
use crate::features::orders::services::OrderService;
use crate::shared::types::ApiResponse;

/// Start a hosted checkout for a cart
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderDto,
    responses(
        (status = 200, description = "Checkout session created", body = ApiResponse<CheckoutSessionResponseDto>),
        (status = 400, description = "Empty cart or invalid item"),
        (status = 500, description = "Payment provider error")
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(service): State<Arc<OrderService>>,
    AppJson(dto): AppJson<CreateOrderDto>,
) -> Result<Json<ApiResponse<CheckoutSessionResponseDto>>> {
    let session = service.checkout(dto).await?;
    Ok(Json(ApiResponse::success(Some(session), None, None)))
}
