//! Checkout flow: the three-step wizard and its order-total rules.
//!
//! # Steps
//!
//! ```text
//! 1 Shipping ──advance (all fields filled)──▶ 2 Payment ──place order──▶ 3 Confirmation
//!            ◀──────────── retreat ──────────
//! ```
//!
//! # Total
//!
//! `subtotal + processing fee + shipping cost`, where shipping is a flat
//! 5.00 (`STANDARD`) or 15.00 (`EXPRESS`) and the processing fee comes from
//! the payment service.
//!
//! # Modules
//!
//! - [`session`] - The controller ([`CheckoutSession`])
//! - [`gateway`] - The port to cart, payment and order services
//! - [`store`] - TTL'd in-memory session store for the HTTP API
//! - [`compensation`] - Handling of orders created but not paid

pub mod compensation;
pub mod error;
pub mod gateway;
pub mod request;
pub mod session;
pub mod shipping;
pub mod step;
pub mod store;
pub mod total;

pub use compensation::{Compensation, CompensationPolicy};
pub use error::CheckoutError;
pub use gateway::{
    CartLine, CartProduct, CartSnapshot, CheckoutGateway, GatewayError, OrderRequest,
    PaymentMethodRef,
};
pub use request::RequestState;
pub use session::{CheckoutSession, Submission, SubmissionOutcome};
pub use shipping::{ShippingField, ShippingInfo};
pub use step::WizardStep;
pub use store::{SessionStore, SharedSession};
pub use total::{OrderSummary, compute_total};
