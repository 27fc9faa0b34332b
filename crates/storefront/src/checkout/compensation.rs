//! What to do with an order that was created but could not be paid.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy applied when payment fails after the order service created an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompensationPolicy {
    /// Keep the unpaid order; the next submission retries only the payment.
    #[default]
    RetryPayment,
    /// Ask the order service to cancel the unpaid order.
    ///
    /// If cancellation itself fails the order is kept and handled as
    /// `RetryPayment`.
    CancelOrder,
}

impl CompensationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RetryPayment => "retry-payment",
            Self::CancelOrder => "cancel-order",
        }
    }
}

impl fmt::Display for CompensationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompensationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retry-payment" => Ok(Self::RetryPayment),
            "cancel-order" => Ok(Self::CancelOrder),
            _ => Err(format!(
                "invalid compensation policy: {s} (expected retry-payment or cancel-order)"
            )),
        }
    }
}

/// Result of compensating a failed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// The order was kept for a payment retry.
    Retained,
    /// The order service cancelled the order.
    Cancelled,
    /// Cancellation was attempted and failed; the order was kept.
    CancelFailed(super::gateway::GatewayError),
}
