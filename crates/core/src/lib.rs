//! Gearline Core - Shared domain types.
//!
//! This crate provides the types used across the Gearline checkout components:
//! - `storefront` - Checkout controller, backend adapter and JSON API
//! - `integration-tests` - In-process HTTP tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, shipping methods and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
