//! Wire types for the hosted backend's REST endpoints.
//!
//! Responses use the backend's `{ success, ..., error }` envelope. Field names
//! are camelCase, with snake_case aliases for rows returned straight from
//! the database.

use chrono::{DateTime, Utc};
use gearline_core::{OrderConfirmation, OrderId, PaymentMethodId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::{CartLine, CartProduct, CartSnapshot, OrderRequest, PaymentMethodRef};

// =============================================================================
// Responses
// =============================================================================

/// Response to `GET /users/{id}/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "cart_items")]
    pub cart_items: Vec<CartItemDto>,
    #[serde(default, alias = "cart_total")]
    pub cart_total: Option<Decimal>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub product: ProductDto,
    pub quantity: u32,
    #[serde(alias = "line_total")]
    pub line_total: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    #[serde(default, alias = "part_number")]
    pub part_number: Option<String>,
    pub price: Decimal,
}

/// Response to `GET /users/{id}/payment-methods`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "payment_methods")]
    pub payment_methods: Vec<PaymentMethodDto>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodDto {
    pub id: PaymentMethodId,
    #[serde(alias = "card_type")]
    pub card_type: String,
    #[serde(alias = "masked_number")]
    pub masked_number: String,
    pub expiry: String,
    #[serde(default, alias = "is_default")]
    pub is_default: bool,
}

/// Response to `POST /payments/processing-fee`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingFeeResponse {
    #[serde(alias = "processing_fee")]
    pub processing_fee: Decimal,
}

/// Response to `POST /users/{id}/orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub order: Option<OrderDto>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Order row. The service mixes `orderNumber`/`createdAt` with `total_amount`.
#[derive(Debug, Deserialize)]
pub struct OrderDto {
    pub id: OrderId,
    #[serde(rename = "orderNumber", alias = "order_number")]
    pub order_number: String,
    #[serde(rename = "total_amount", alias = "totalAmount")]
    pub total_amount: Decimal,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Bare `{ success, error }` envelope (payments, cancellations).
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProcessingFeeRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest<'a> {
    pub order_data: OrderData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData<'a> {
    pub shipping_address: &'a str,
    pub shipping_city: &'a str,
    pub shipping_state: &'a str,
    pub shipping_zip: &'a str,
    pub shipping_country: &'a str,
    pub shipping_method: &'static str,
    pub payment_method_id: PaymentMethodId,
    pub idempotency_key: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub payment_method_id: PaymentMethodId,
}

// =============================================================================
// Conversions
// =============================================================================

impl<'a> From<&'a OrderRequest> for CreateOrderRequest<'a> {
    fn from(request: &'a OrderRequest) -> Self {
        let shipping = &request.shipping;
        Self {
            order_data: OrderData {
                shipping_address: shipping.address.trim(),
                shipping_city: shipping.city.trim(),
                shipping_state: shipping.state.trim(),
                shipping_zip: shipping.zip.trim(),
                shipping_country: shipping.country.trim(),
                shipping_method: shipping.method.as_str(),
                payment_method_id: request.payment_method_id,
                idempotency_key: request.idempotency_key,
            },
        }
    }
}

impl CartResponse {
    /// Convert into a snapshot. A missing `cartTotal` is the sum of line totals.
    pub fn into_snapshot(self) -> CartSnapshot {
        let items: Vec<CartLine> = self.cart_items.into_iter().map(CartLine::from).collect();
        let subtotal = self
            .cart_total
            .unwrap_or_else(|| items.iter().map(|line| line.line_total).sum());
        CartSnapshot { items, subtotal }
    }
}

impl From<CartItemDto> for CartLine {
    fn from(item: CartItemDto) -> Self {
        Self {
            product: CartProduct {
                id: item.product.id,
                name: item.product.name,
                part_number: item.product.part_number,
                unit_price: item.product.price,
            },
            quantity: item.quantity,
            line_total: item.line_total,
        }
    }
}

impl From<PaymentMethodDto> for PaymentMethodRef {
    fn from(method: PaymentMethodDto) -> Self {
        Self {
            id: method.id,
            card_type: method.card_type,
            masked_number: method.masked_number,
            expiry: method.expiry,
            is_default: method.is_default,
        }
    }
}

impl From<OrderDto> for OrderConfirmation {
    fn from(order: OrderDto) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            total_amount: order.total_amount,
            created_at: order.created_at,
        }
    }
}
