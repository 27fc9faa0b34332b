//! Core types for Gearline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod shipping;

pub use id::*;
pub use order::OrderConfirmation;
pub use price::{CurrencyCode, Price};
pub use shipping::ShippingMethod;
