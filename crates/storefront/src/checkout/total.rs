//! Order total computation.

use gearline_core::{Price, ShippingMethod};
use rust_decimal::Decimal;
use serde::Serialize;

/// Order total: `subtotal + processing_fee + shipping cost of method`.
///
/// No rounding is applied; two-decimal rounding happens at display time.
#[must_use]
pub fn compute_total(subtotal: Decimal, processing_fee: Decimal, method: ShippingMethod) -> Decimal {
    subtotal + processing_fee + method.cost()
}

/// Breakdown of the figures shown beside the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub processing_fee: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Build a summary for the given inputs.
    #[must_use]
    pub fn new(subtotal: Decimal, processing_fee: Decimal, method: ShippingMethod) -> Self {
        Self {
            subtotal,
            processing_fee,
            shipping_cost: method.cost(),
            total: compute_total(subtotal, processing_fee, method),
        }
    }

    /// Total as a display price (e.g., "$358.28").
    #[must_use]
    pub fn total_display(&self) -> String {
        Price::usd(self.total).display()
    }
}
