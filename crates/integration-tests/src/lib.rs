//! Integration tests for the Gearline checkout API.
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! against an in-memory gateway; no backend or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gearline-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use gearline_core::{PaymentMethodId, ProductId, UserId};
use gearline_storefront::checkout::gateway::testing::FakeGateway;
use gearline_storefront::checkout::{
    CartLine, CartProduct, CartSnapshot, CheckoutGateway, CompensationPolicy, PaymentMethodRef,
};
use gearline_storefront::config::CheckoutConfig;
use gearline_storefront::middleware::USER_ID_HEADER;
use gearline_storefront::state::AppState;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

/// A cart of brake parts totalling 342.99.
#[must_use]
pub fn brake_cart() -> CartSnapshot {
    CartSnapshot {
        items: vec![
            CartLine {
                product: CartProduct {
                    id: ProductId::generate(),
                    name: "Front brake rotor pair".to_string(),
                    part_number: Some("BR-5521".to_string()),
                    unit_price: Decimal::new(14650, 2),
                },
                quantity: 2,
                line_total: Decimal::new(29300, 2),
            },
            CartLine {
                product: CartProduct {
                    id: ProductId::generate(),
                    name: "Ceramic brake pads".to_string(),
                    part_number: None,
                    unit_price: Decimal::new(4999, 2),
                },
                quantity: 1,
                line_total: Decimal::new(4999, 2),
            },
        ],
        subtotal: Decimal::new(34299, 2),
    }
}

/// Two saved cards; the second is flagged default.
#[must_use]
pub fn saved_cards() -> Vec<PaymentMethodRef> {
    vec![
        PaymentMethodRef {
            id: PaymentMethodId::generate(),
            card_type: "Visa".to_string(),
            masked_number: "**** 4242".to_string(),
            expiry: "08/28".to_string(),
            is_default: false,
        },
        PaymentMethodRef {
            id: PaymentMethodId::generate(),
            card_type: "Mastercard".to_string(),
            masked_number: "**** 5100".to_string(),
            expiry: "11/27".to_string(),
            is_default: true,
        },
    ]
}

/// Fake gateway serving [`brake_cart`], [`saved_cards`] and a 10.29 fee.
#[must_use]
pub fn fake_gateway() -> FakeGateway {
    FakeGateway::new(brake_cart(), saved_cards(), Decimal::new(1029, 2))
}

/// Build the storefront router around `gateway`.
pub fn app_with(gateway: Arc<dyn CheckoutGateway>, policy: CompensationPolicy) -> Router {
    let checkout = CheckoutConfig {
        compensation: policy,
        ..CheckoutConfig::default()
    };
    gearline_storefront::app(AppState::new(gateway, checkout))
}

/// Router plus a handle on its fake gateway for call assertions.
pub struct TestContext {
    pub app: Router,
    pub gateway: Arc<FakeGateway>,
    pub user_id: UserId,
}

impl TestContext {
    /// Context over [`fake_gateway`] with the given compensation policy.
    #[must_use]
    pub fn new(policy: CompensationPolicy) -> Self {
        Self::with_gateway(fake_gateway(), policy)
    }

    /// Context over a pre-configured fake.
    #[must_use]
    pub fn with_gateway(gateway: FakeGateway, policy: CompensationPolicy) -> Self {
        let gateway = Arc::new(gateway);
        Self {
            app: app_with(Arc::clone(&gateway) as Arc<dyn CheckoutGateway>, policy),
            gateway,
            user_id: UserId::generate(),
        }
    }

    /// Send a request as this context's user.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.app, method, uri, Some(self.user_id), body).await
    }

    /// Start a checkout as this context's user and return its id.
    pub async fn start_checkout(&self) -> String {
        start_checkout(&self.app, self.user_id).await
    }

    /// Move this context's checkout to the payment step.
    pub async fn reach_payment(&self, id: &str) {
        reach_payment(&self.app, self.user_id, id).await;
    }
}

/// Start a checkout and return its id.
pub async fn start_checkout(app: &Router, user_id: UserId) -> String {
    let (status, view) = send(app, Method::POST, "/api/checkout", Some(user_id), None).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected view: {view}");
    view["id"]
        .as_str()
        .expect("view carries the session id")
        .to_string()
}

/// Fill in a complete shipping address and move to the payment step.
pub async fn reach_payment(app: &Router, user_id: UserId, id: &str) {
    let (status, _) = send(
        app,
        Method::PUT,
        &format!("/api/checkout/{id}/shipping"),
        Some(user_id),
        Some(serde_json::json!({
            "address": "1200 Industrial Pkwy",
            "city": "Dayton",
            "state": "OH",
            "zip": "45402"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = send(
        app,
        Method::POST,
        &format!("/api/checkout/{id}/advance"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], 2);
}

/// Send a request to `app`, optionally as `user`, and decode the JSON body.
///
/// Non-JSON bodies decode to `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<UserId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header(USER_ID_HEADER, user_id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
