//! The checkout's single port to the hosted backend.
//!
//! Cart, payment and order services are reached only through
//! [`CheckoutGateway`], so the controller can be driven by the REST adapter
//! in [`crate::backend`] or by [`testing::FakeGateway`].

use async_trait::async_trait;
use gearline_core::{OrderConfirmation, OrderId, PaymentMethodId, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::shipping::ShippingInfo;

/// Failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The service answered but reported `success: false`.
    #[error("rejected by service: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// The call did not complete, or its response could not be read.
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Message the service itself reported, safe to show to the shopper.
    #[must_use]
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(Some(message)) if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Product details carried on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub part_number: Option<String>,
    pub unit_price: Decimal,
}

/// One line of the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: CartProduct,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Cart contents fetched once per checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
}

impl CartSnapshot {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// A saved payment method the shopper can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRef {
    pub id: PaymentMethodId,
    pub card_type: String,
    pub masked_number: String,
    pub expiry: String,
    pub is_default: bool,
}

/// Pick the method flagged default, else the first one listed.
#[must_use]
pub fn default_payment_method(methods: &[PaymentMethodRef]) -> Option<PaymentMethodId> {
    methods
        .iter()
        .find(|method| method.is_default)
        .or_else(|| methods.first())
        .map(|method| method.id)
}

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub shipping: ShippingInfo,
    pub payment_method_id: PaymentMethodId,
    /// Stable for the lifetime of a checkout session.
    pub idempotency_key: Uuid,
}

/// Operations the checkout needs from the hosted backend.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Fetch the user's cart.
    async fn cart_items(&self, user_id: UserId) -> Result<CartSnapshot, GatewayError>;

    /// Fetch the user's saved payment methods.
    async fn payment_methods(&self, user_id: UserId)
    -> Result<Vec<PaymentMethodRef>, GatewayError>;

    /// Processing fee charged on the given amount.
    async fn processing_fee(&self, amount: Decimal) -> Result<Decimal, GatewayError>;

    /// Create an order. Nothing is charged yet.
    async fn create_order(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, GatewayError>;

    /// Charge `amount` against a previously created order.
    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<(), GatewayError>;

    /// Cancel an order that was created but never paid.
    async fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError>;
}

pub mod testing {
    //! In-memory gateway for tests and local runs.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::checkout::total::compute_total;

    /// Scriptable [`CheckoutGateway`] that records every call.
    ///
    /// Each operation succeeds unless a failure has been queued for it with
    /// the matching `fail_*` method; queued failures are consumed in order.
    pub struct FakeGateway {
        cart: CartSnapshot,
        payment_methods: Vec<PaymentMethodRef>,
        processing_fee: Decimal,
        order_total: Option<Decimal>,
        failures: Mutex<Failures>,
        created_orders: Mutex<Vec<(UserId, OrderRequest)>>,
        payments: Mutex<Vec<(OrderId, Decimal, PaymentMethodId)>>,
        cancellations: Mutex<Vec<OrderId>>,
        order_sequence: AtomicUsize,
    }

    #[derive(Default)]
    struct Failures {
        cart: VecDeque<GatewayError>,
        payment_methods: VecDeque<GatewayError>,
        processing_fee: VecDeque<GatewayError>,
        create_order: VecDeque<GatewayError>,
        process_payment: VecDeque<GatewayError>,
        cancel_order: VecDeque<GatewayError>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl FakeGateway {
        /// A gateway serving the given cart, saved methods and processing fee.
        #[must_use]
        pub fn new(
            cart: CartSnapshot,
            payment_methods: Vec<PaymentMethodRef>,
            processing_fee: Decimal,
        ) -> Self {
            Self {
                cart,
                payment_methods,
                processing_fee,
                order_total: None,
                failures: Mutex::new(Failures::default()),
                created_orders: Mutex::new(Vec::new()),
                payments: Mutex::new(Vec::new()),
                cancellations: Mutex::new(Vec::new()),
                order_sequence: AtomicUsize::new(0),
            }
        }

        /// Force the `total_amount` reported for created orders.
        ///
        /// By default the fake reports the locally computed checkout total.
        #[must_use]
        pub fn with_order_total(mut self, total: Decimal) -> Self {
            self.order_total = Some(total);
            self
        }

        pub fn fail_cart(&self, error: GatewayError) {
            lock(&self.failures).cart.push_back(error);
        }

        pub fn fail_payment_methods(&self, error: GatewayError) {
            lock(&self.failures).payment_methods.push_back(error);
        }

        pub fn fail_processing_fee(&self, error: GatewayError) {
            lock(&self.failures).processing_fee.push_back(error);
        }

        pub fn fail_create_order(&self, error: GatewayError) {
            lock(&self.failures).create_order.push_back(error);
        }

        pub fn fail_process_payment(&self, error: GatewayError) {
            lock(&self.failures).process_payment.push_back(error);
        }

        pub fn fail_cancel_order(&self, error: GatewayError) {
            lock(&self.failures).cancel_order.push_back(error);
        }

        /// Orders created so far.
        #[must_use]
        pub fn created_orders(&self) -> Vec<(UserId, OrderRequest)> {
            lock(&self.created_orders).clone()
        }

        /// Payments attempted so far, successful or not.
        #[must_use]
        pub fn payments(&self) -> Vec<(OrderId, Decimal, PaymentMethodId)> {
            lock(&self.payments).clone()
        }

        /// Cancellations attempted so far, successful or not.
        #[must_use]
        pub fn cancellations(&self) -> Vec<OrderId> {
            lock(&self.cancellations).clone()
        }

        fn next_failure(
            &self,
            pick: impl FnOnce(&mut Failures) -> &mut VecDeque<GatewayError>,
        ) -> Result<(), GatewayError> {
            pick(&mut lock(&self.failures))
                .pop_front()
                .map_or(Ok(()), Err)
        }
    }

    #[async_trait]
    impl CheckoutGateway for FakeGateway {
        async fn cart_items(&self, _user_id: UserId) -> Result<CartSnapshot, GatewayError> {
            self.next_failure(|f| &mut f.cart)?;
            Ok(self.cart.clone())
        }

        async fn payment_methods(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
            self.next_failure(|f| &mut f.payment_methods)?;
            Ok(self.payment_methods.clone())
        }

        async fn processing_fee(&self, _amount: Decimal) -> Result<Decimal, GatewayError> {
            self.next_failure(|f| &mut f.processing_fee)?;
            Ok(self.processing_fee)
        }

        async fn create_order(
            &self,
            user_id: UserId,
            request: &OrderRequest,
        ) -> Result<OrderConfirmation, GatewayError> {
            self.next_failure(|f| &mut f.create_order)?;
            lock(&self.created_orders).push((user_id, request.clone()));

            let sequence = self.order_sequence.fetch_add(1, Ordering::SeqCst) + 1;
            let total_amount = self.order_total.unwrap_or_else(|| {
                compute_total(
                    self.cart.subtotal,
                    self.processing_fee,
                    request.shipping.method,
                )
            });
            let created_at = Utc
                .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
                .single()
                .unwrap_or_else(Utc::now);

            Ok(OrderConfirmation {
                id: OrderId::generate(),
                order_number: format!("GL-{:06}", 1000 + sequence),
                total_amount,
                created_at,
            })
        }

        async fn process_payment(
            &self,
            order_id: OrderId,
            amount: Decimal,
            payment_method_id: PaymentMethodId,
        ) -> Result<(), GatewayError> {
            lock(&self.payments).push((order_id, amount, payment_method_id));
            self.next_failure(|f| &mut f.process_payment)
        }

        async fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError> {
            lock(&self.cancellations).push(order_id);
            self.next_failure(|f| &mut f.cancel_order)
        }
    }
}
