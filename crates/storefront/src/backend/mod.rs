//! Hosted backend REST client.
//!
//! Implements [`CheckoutGateway`] on top of the backend's cart, payment and
//! order endpoints.
//!
//! # Endpoints
//!
//! ```text
//! GET  {base}/users/{user_id}/cart             - cart items + total
//! GET  {base}/users/{user_id}/payment-methods  - saved payment methods
//! POST {base}/payments/processing-fee          - fee for an amount
//! POST {base}/users/{user_id}/orders           - create order
//! POST {base}/payments                         - charge an order
//! POST {base}/orders/{order_id}/cancel         - cancel an unpaid order
//! ```

mod types;

use std::sync::Arc;

use async_trait::async_trait;
use gearline_core::{OrderConfirmation, OrderId, PaymentMethodId, UserId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::checkout::{
    CartSnapshot, CheckoutGateway, GatewayError, OrderRequest, PaymentMethodRef,
};
use crate::config::BackendConfig;

use types::{
    CartResponse, CreateOrderRequest, CreateOrderResponse, PaymentMethodsResponse,
    ProcessPaymentRequest, ProcessingFeeRequest, ProcessingFeeResponse, StatusResponse,
};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a readable envelope.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered `success: false`.
    #[error("Rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Service key cannot be used as a header value.
    #[error("Invalid service key: {0}")]
    InvalidKey(String),
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(message) => Self::Rejected(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Client for the hosted backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the service key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let key = config.service_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut apikey = HeaderValue::from_str(key)
            .map_err(|e| BackendError::InvalidKey(e.to_string()))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| BackendError::InvalidKey(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.inner.client.get(self.endpoint(path)).send().await?;
        read_envelope(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;
        read_envelope(response).await
    }

    /// Fetch the user's cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartSnapshot, BackendError> {
        let response: CartResponse = self.get_json(&format!("users/{user_id}/cart")).await?;
        check_success(response.success, response.error.clone())?;
        let snapshot = response.into_snapshot();
        debug!(lines = snapshot.items.len(), subtotal = %snapshot.subtotal, "Fetched cart");
        Ok(snapshot)
    }

    /// Fetch the user's saved payment methods.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it.
    #[instrument(skip(self))]
    pub async fn get_payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethodRef>, BackendError> {
        let response: PaymentMethodsResponse = self
            .get_json(&format!("users/{user_id}/payment-methods"))
            .await?;
        check_success(response.success, response.error)?;
        Ok(response
            .payment_methods
            .into_iter()
            .map(PaymentMethodRef::from)
            .collect())
    }

    /// Ask the payment service for the processing fee on `amount`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no fee.
    #[instrument(skip(self))]
    pub async fn calculate_processing_fee(&self, amount: Decimal) -> Result<Decimal, BackendError> {
        let response: ProcessingFeeResponse = self
            .post_json("payments/processing-fee", &ProcessingFeeRequest { amount })
            .await?;
        Ok(response.processing_fee)
    }

    /// Create an order for the user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the service rejects it, or a
    /// successful response carries no order.
    #[instrument(skip(self, request), fields(payment_method_id = %request.payment_method_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, BackendError> {
        let body = CreateOrderRequest::from(request);
        let response: CreateOrderResponse = self
            .post_json(&format!("users/{user_id}/orders"), &body)
            .await?;
        check_success(response.success, response.error)?;
        response
            .order
            .map(OrderConfirmation::from)
            .ok_or_else(|| BackendError::Parse("order missing from successful response".into()))
    }

    /// Charge an order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payment is declined.
    #[instrument(skip(self))]
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<(), BackendError> {
        let body = ProcessPaymentRequest {
            order_id,
            amount,
            payment_method_id,
        };
        let response: StatusResponse = self.post_json("payments", &body).await?;
        check_success(response.success, response.error)
    }

    /// Cancel an unpaid order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service refuses.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), BackendError> {
        let response: StatusResponse = self
            .post_json(&format!("orders/{order_id}/cancel"), &serde_json::json!({}))
            .await?;
        check_success(response.success, response.error)
    }
}

/// Read a response body as `T`.
///
/// A non-2xx status whose body still parses as the envelope is returned as
/// parsed, so the service's `error` message is preserved.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<T>(&body) {
        Ok(parsed) => {
            if !status.is_success() {
                warn!(status = status.as_u16(), "Backend returned error status with envelope");
            }
            Ok(parsed)
        }
        Err(e) if status.is_success() => Err(BackendError::Parse(e.to_string())),
        Err(_) => Err(BackendError::Api {
            status: status.as_u16(),
            message: body,
        }),
    }
}

fn check_success(success: bool, error: Option<String>) -> Result<(), BackendError> {
    if success {
        Ok(())
    } else {
        Err(BackendError::Rejected(error))
    }
}

#[async_trait]
impl CheckoutGateway for BackendClient {
    async fn cart_items(&self, user_id: UserId) -> Result<CartSnapshot, GatewayError> {
        Ok(self.get_cart(user_id).await?)
    }

    async fn payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
        Ok(self.get_payment_methods(user_id).await?)
    }

    async fn processing_fee(&self, amount: Decimal) -> Result<Decimal, GatewayError> {
        Ok(self.calculate_processing_fee(amount).await?)
    }

    async fn create_order(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, GatewayError> {
        Ok(Self::create_order(self, user_id, request).await?)
    }

    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<(), GatewayError> {
        Ok(Self::process_payment(self, order_id, amount, payment_method_id).await?)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError> {
        Ok(Self::cancel_order(self, order_id).await?)
    }
}
