//! Checkout errors and the banner text shown for each.

use gearline_core::{OrderId, PaymentMethodId};
use thiserror::Error;

use super::gateway::GatewayError;
use super::shipping::ShippingField;
use super::step::WizardStep;

pub const SHIPPING_INCOMPLETE_MESSAGE: &str = "Please fill in all shipping information fields";
pub const NO_PAYMENT_METHOD_MESSAGE: &str = "Please select a payment method";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load checkout information. Please try again.";
pub const ORDER_FAILED_MESSAGE: &str = "Failed to create order";
pub const PAYMENT_FAILED_MESSAGE: &str = "Payment processing failed";

/// Errors produced by checkout operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A required shipping field is blank.
    #[error("shipping information incomplete: missing {}", join_fields(.missing))]
    IncompleteShipping { missing: Vec<ShippingField> },

    /// Order placement was attempted without a payment method.
    #[error("no payment method selected")]
    NoPaymentMethod,

    /// The chosen payment method is not one of the user's saved methods.
    #[error("payment method {0} is not available for this checkout")]
    UnknownPaymentMethod(PaymentMethodId),

    /// An order submission is already pending for this session.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The operation is not valid at the current wizard step.
    #[error("cannot {action} at step {step}")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },

    /// Cart, payment method or fee retrieval failed.
    #[error("failed to load checkout data: {0}")]
    Load(GatewayError),

    /// The order service did not create the order.
    #[error("order creation failed: {0}")]
    OrderCreation(GatewayError),

    /// The order exists but charging it failed.
    #[error("payment failed for order {order_id}: {source}")]
    PaymentProcessing {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },
}

impl CheckoutError {
    /// Single user-visible message for the error banner.
    ///
    /// Service-reported messages are passed through verbatim; transport
    /// details never reach the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::IncompleteShipping { .. } => SHIPPING_INCOMPLETE_MESSAGE.to_string(),
            Self::NoPaymentMethod => NO_PAYMENT_METHOD_MESSAGE.to_string(),
            Self::UnknownPaymentMethod(_) => {
                "The selected payment method is not available".to_string()
            }
            Self::SubmissionInFlight => "Your order is already being placed".to_string(),
            Self::InvalidTransition { .. } => {
                "This checkout step is not available right now".to_string()
            }
            Self::Load(_) => LOAD_FAILED_MESSAGE.to_string(),
            Self::OrderCreation(err) => err
                .service_message()
                .unwrap_or(ORDER_FAILED_MESSAGE)
                .to_string(),
            Self::PaymentProcessing { source, .. } => source
                .service_message()
                .unwrap_or(PAYMENT_FAILED_MESSAGE)
                .to_string(),
        }
    }

    /// Whether the request conflicts with the session's current state
    /// (wrong step, or a submission already in flight).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SubmissionInFlight | Self::InvalidTransition { .. }
        )
    }

    /// Whether the error came from local validation rather than a service.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::IncompleteShipping { .. } | Self::NoPaymentMethod | Self::UnknownPaymentMethod(_)
        )
    }
}

fn join_fields(fields: &[ShippingField]) -> String {
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = CheckoutError::IncompleteShipping {
            missing: vec![ShippingField::City, ShippingField::Zip],
        };
        assert_eq!(err.user_message(), SHIPPING_INCOMPLETE_MESSAGE);
        assert_eq!(
            err.to_string(),
            "shipping information incomplete: missing city, zip"
        );
        assert_eq!(
            CheckoutError::NoPaymentMethod.user_message(),
            "Please select a payment method"
        );
    }

    #[test]
    fn test_service_message_passes_through() {
        let err = CheckoutError::OrderCreation(GatewayError::Rejected(Some(
            "Part BP-1123 is out of stock".to_string(),
        )));
        assert_eq!(err.user_message(), "Part BP-1123 is out of stock");
    }

    #[test]
    fn test_fallback_messages() {
        let err = CheckoutError::OrderCreation(GatewayError::Rejected(None));
        assert_eq!(err.user_message(), ORDER_FAILED_MESSAGE);

        let err = CheckoutError::PaymentProcessing {
            order_id: OrderId::generate(),
            source: GatewayError::Transport("tcp connect error".to_string()),
        };
        assert_eq!(err.user_message(), PAYMENT_FAILED_MESSAGE);
        assert!(err.to_string().contains("tcp connect error"));
    }

    #[test]
    fn test_is_validation() {
        assert!(CheckoutError::NoPaymentMethod.is_validation());
        assert!(!CheckoutError::SubmissionInFlight.is_validation());
        assert!(!CheckoutError::Load(GatewayError::Rejected(None)).is_validation());
    }

    #[test]
    fn test_is_conflict() {
        assert!(CheckoutError::SubmissionInFlight.is_conflict());
        assert!(
            CheckoutError::InvalidTransition {
                step: WizardStep::Confirmation,
                action: "place an order",
            }
            .is_conflict()
        );
        assert!(!CheckoutError::NoPaymentMethod.is_conflict());
    }
}
