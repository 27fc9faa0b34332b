//! Integration tests for the checkout API.
//!
//! These drive the full router (extractors, middleware, handlers, session
//! store) against an in-memory gateway.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use gearline_core::{OrderConfirmation, OrderId, PaymentMethodId, UserId};
use gearline_integration_tests::{
    TestContext, app_with, fake_gateway, reach_payment, send, start_checkout,
};
use gearline_storefront::checkout::gateway::testing::FakeGateway;
use gearline_storefront::checkout::{
    CartSnapshot, CheckoutGateway, CompensationPolicy, GatewayError, OrderRequest,
    PaymentMethodRef,
};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Notify;

// =============================================================================
// Access
// =============================================================================

#[tokio::test]
async fn test_health_is_open() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let (status, _) = send(&ctx.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_requires_user() {
    let ctx = TestContext::new(CompensationPolicy::default());

    let (status, body) = send(&ctx.app, Method::POST, "/api/checkout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert!(ctx.gateway.created_orders().is_empty());
}

#[tokio::test]
async fn test_other_users_session_is_not_found() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;

    let (status, _) = send(
        &ctx.app,
        Method::GET,
        &format!("/api/checkout/{id}"),
        Some(UserId::generate()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let (status, _) = ctx
        .send(
            Method::GET,
            "/api/checkout/6a1f0c2e-9b7d-4e3a-8f51-0d2c4b6e8a90",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Wizard
// =============================================================================

#[tokio::test]
async fn test_create_loads_checkout_data() {
    let ctx = TestContext::new(CompensationPolicy::default());

    let (status, view) = ctx.send(Method::POST, "/api/checkout", None).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(view["step"], 1);
    assert_eq!(view["loadState"]["status"], "succeeded");
    assert_eq!(view["cart"]["subtotal"], "342.99");
    assert_eq!(view["processingFee"], "10.29");
    assert_eq!(view["shippingCost"], "5.00");
    assert_eq!(view["total"], "358.28");
    assert_eq!(view["totalDisplay"], "$358.28");
    assert_eq!(view["shipping"]["country"], "US");

    // The card flagged default is pre-selected, not the first one.
    assert_eq!(
        view["selectedPaymentMethodId"],
        view["paymentMethods"][1]["id"]
    );
}

#[tokio::test]
async fn test_load_failure_sets_banner() {
    let gateway = fake_gateway();
    gateway.fail_processing_fee(GatewayError::Transport("connection reset".to_string()));
    let ctx = TestContext::with_gateway(gateway, CompensationPolicy::default());

    let (status, view) = ctx.send(Method::POST, "/api/checkout", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        view["error"],
        "Failed to load checkout information. Please try again."
    );
    assert_eq!(view["loadState"]["status"], "failed");
    // Data fetched before the failure is kept.
    assert_eq!(view["cart"]["subtotal"], "342.99");
    assert!(view["processingFee"].is_null());
}

#[tokio::test]
async fn test_incomplete_shipping_is_rejected() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/checkout/{id}/shipping"),
            Some(json!({ "address": "1200 Industrial Pkwy", "city": "Dayton" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/advance"), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(view["step"], 1);
    assert_eq!(view["error"], "Please fill in all shipping information fields");
}

#[tokio::test]
async fn test_express_shipping_changes_total() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;

    let (status, view) = ctx
        .send(
            Method::PUT,
            &format!("/api/checkout/{id}/shipping"),
            Some(json!({ "method": "EXPRESS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["shippingCost"], "15.00");
    assert_eq!(view["totalDisplay"], "$368.28");
}

#[tokio::test]
async fn test_back_returns_to_shipping() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;
    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/back"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 1);
    assert_eq!(view["shipping"]["city"], "Dayton");

    // Already at the first step: nothing changes.
    let (_, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/back"), None)
        .await;
    assert_eq!(view["step"], 1);
}

#[tokio::test]
async fn test_select_payment_method() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;

    // Not yet at the payment step.
    let (_, view) = ctx.send(Method::GET, &format!("/api/checkout/{id}"), None).await;
    let first_card = view["paymentMethods"][0]["id"].clone();
    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/checkout/{id}/payment-method"),
            Some(json!({ "paymentMethodId": first_card })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(
            Method::PUT,
            &format!("/api/checkout/{id}/payment-method"),
            Some(json!({ "paymentMethodId": PaymentMethodId::generate() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(view["error"].is_string());

    let (status, view) = ctx
        .send(
            Method::PUT,
            &format!("/api/checkout/{id}/payment-method"),
            Some(json!({ "paymentMethodId": first_card })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["selectedPaymentMethodId"], first_card);
    assert!(view["error"].is_null());
}

// =============================================================================
// Placing orders
// =============================================================================

#[tokio::test]
async fn test_place_order_before_payment_step_conflicts() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;

    let (status, _) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(ctx.gateway.created_orders().is_empty());
}

#[tokio::test]
async fn test_full_checkout() {
    let ctx = TestContext::new(CompensationPolicy::default());
    let id = ctx.start_checkout().await;
    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 3);
    assert_eq!(view["stepLabel"], "confirmation");
    assert_eq!(view["submissionState"]["status"], "succeeded");
    assert_eq!(view["confirmation"]["orderNumber"], "GL-001001");
    assert_eq!(view["confirmation"]["totalAmount"], "358.28");
    assert_eq!(view["confirmationTotalDisplay"], "$358.28");
    assert!(view["error"].is_null());

    let created = ctx.gateway.created_orders();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, ctx.user_id);
    assert_eq!(created[0].1.shipping.zip, "45402");

    let payments = ctx.gateway.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].1, Decimal::new(35828, 2));

    // Confirmation is terminal.
    let (_, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/back"), None)
        .await;
    assert_eq!(view["step"], 3);
    let (status, _) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ctx.gateway.created_orders().len(), 1);
}

#[tokio::test]
async fn test_order_rejection_shows_service_message() {
    let gateway = fake_gateway();
    gateway.fail_create_order(GatewayError::Rejected(Some(
        "Part BR-5521 is out of stock".to_string(),
    )));
    let ctx = TestContext::with_gateway(gateway, CompensationPolicy::default());
    let id = ctx.start_checkout().await;
    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 2);
    assert_eq!(view["error"], "Part BR-5521 is out of stock");
    assert_eq!(view["submissionState"]["status"], "failed");
    assert!(ctx.gateway.payments().is_empty());
}

#[tokio::test]
async fn test_payment_retry_reuses_order() {
    let gateway = fake_gateway();
    gateway.fail_process_payment(GatewayError::Rejected(Some("Card declined".to_string())));
    let ctx = TestContext::with_gateway(gateway, CompensationPolicy::RetryPayment);
    let id = ctx.start_checkout().await;
    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 2);
    assert_eq!(view["error"], "Card declined");
    assert_eq!(view["awaitingPayment"]["orderNumber"], "GL-001001");

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 3);
    assert_eq!(view["confirmation"]["orderNumber"], "GL-001001");

    assert_eq!(ctx.gateway.created_orders().len(), 1);
    let payments = ctx.gateway.payments();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].0, payments[1].0);
    assert!(ctx.gateway.cancellations().is_empty());
}

#[tokio::test]
async fn test_payment_failure_cancels_order() {
    let gateway = fake_gateway();
    gateway.fail_process_payment(GatewayError::Transport("timed out".to_string()));
    let ctx = TestContext::with_gateway(gateway, CompensationPolicy::CancelOrder);
    let id = ctx.start_checkout().await;
    ctx.reach_payment(&id).await;

    let (status, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["error"], "Payment processing failed");
    assert!(view["awaitingPayment"].is_null());

    let payments = ctx.gateway.payments();
    assert_eq!(ctx.gateway.cancellations(), vec![payments[0].0]);

    // A retry creates a fresh order.
    let (_, view) = ctx
        .send(Method::POST, &format!("/api/checkout/{id}/place-order"), None)
        .await;
    assert_eq!(view["step"], 3);
    assert_eq!(ctx.gateway.created_orders().len(), 2);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Gateway whose `create_order` waits until released.
struct StallingGateway {
    inner: FakeGateway,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl CheckoutGateway for StallingGateway {
    async fn cart_items(&self, user_id: UserId) -> Result<CartSnapshot, GatewayError> {
        self.inner.cart_items(user_id).await
    }

    async fn payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
        self.inner.payment_methods(user_id).await
    }

    async fn processing_fee(&self, amount: Decimal) -> Result<Decimal, GatewayError> {
        self.inner.processing_fee(amount).await
    }

    async fn create_order(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, GatewayError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.create_order(user_id, request).await
    }

    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<(), GatewayError> {
        self.inner
            .process_payment(order_id, amount, payment_method_id)
            .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError> {
        self.inner.cancel_order(order_id).await
    }
}

#[tokio::test]
async fn test_concurrent_place_order_conflicts() {
    let gateway = Arc::new(StallingGateway {
        inner: fake_gateway(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let app = app_with(
        Arc::clone(&gateway) as Arc<dyn CheckoutGateway>,
        CompensationPolicy::default(),
    );
    let user_id = UserId::generate();
    let id = start_checkout(&app, user_id).await;
    reach_payment(&app, user_id, &id).await;
    let uri = format!("/api/checkout/{id}/place-order");

    let first = tokio::spawn({
        let app = app.clone();
        let uri = uri.clone();
        async move { send(&app, Method::POST, &uri, Some(user_id), None).await }
    });
    gateway.entered.notified().await;

    let (status, _) = send(&app, Method::POST, &uri, Some(user_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, view) = send(
        &app,
        Method::GET,
        &format!("/api/checkout/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(view["submissionState"]["status"], "pending");

    // Going back is ignored while the order is in flight.
    let (_, view) = send(
        &app,
        Method::POST,
        &format!("/api/checkout/{id}/back"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(view["step"], 2);

    gateway.release.notify_one();
    let (status, view) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 3);
    assert_eq!(gateway.inner.created_orders().len(), 1);
}

/// Gateway whose order creation panics, killing the submission task.
struct PanickingGateway(FakeGateway);

#[async_trait]
impl CheckoutGateway for PanickingGateway {
    async fn cart_items(&self, user_id: UserId) -> Result<CartSnapshot, GatewayError> {
        self.0.cart_items(user_id).await
    }

    async fn payment_methods(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
        self.0.payment_methods(user_id).await
    }

    async fn processing_fee(&self, amount: Decimal) -> Result<Decimal, GatewayError> {
        self.0.processing_fee(amount).await
    }

    async fn create_order(
        &self,
        _user_id: UserId,
        _request: &OrderRequest,
    ) -> Result<OrderConfirmation, GatewayError> {
        panic!("order service client crashed");
    }

    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Decimal,
        payment_method_id: PaymentMethodId,
    ) -> Result<(), GatewayError> {
        self.0
            .process_payment(order_id, amount, payment_method_id)
            .await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError> {
        self.0.cancel_order(order_id).await
    }
}

#[tokio::test]
async fn test_crashed_submission_is_marked_failed() {
    let app = app_with(
        Arc::new(PanickingGateway(fake_gateway())),
        CompensationPolicy::default(),
    );
    let user_id = UserId::generate();
    let id = start_checkout(&app, user_id).await;
    reach_payment(&app, user_id, &id).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/checkout/{id}/place-order"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, view) = send(
        &app,
        Method::GET,
        &format!("/api/checkout/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(view["submissionState"]["status"], "failed");
    assert_eq!(view["step"], 2);
    assert!(view["error"].is_string());
}
