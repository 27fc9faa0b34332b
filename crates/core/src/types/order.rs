//! Orders as returned by the order service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::price::Price;

/// A placed order, exactly as the order service reported it.
///
/// The checkout confirmation shows these values unchanged; in particular the
/// total is the service's `total_amount`, never a locally recomputed figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub id: OrderId,
    pub order_number: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OrderConfirmation {
    /// Total amount as a USD price for display.
    #[must_use]
    pub const fn total(&self) -> Price {
        Price::usd(self.total_amount)
    }
}
