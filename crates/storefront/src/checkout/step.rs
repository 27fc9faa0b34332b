//! Wizard steps.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One of the three sequential phases of checkout.
///
/// Serialized as its step number (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WizardStep {
    /// Step 1: shipping address and method entry.
    #[default]
    Shipping,
    /// Step 2: payment method selection and order placement.
    Payment,
    /// Step 3: order confirmation. Terminal.
    Confirmation,
}

impl WizardStep {
    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Confirmation => 3,
        }
    }

    /// Step for a 1-based number, if in range.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Shipping),
            2 => Some(Self::Payment),
            3 => Some(Self::Confirmation),
            _ => None,
        }
    }

    /// The step before this one, or `None` when backward movement is not allowed.
    ///
    /// Confirmation is terminal: once an order is placed the wizard cannot be
    /// walked back into payment.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Payment => Some(Self::Shipping),
            Self::Shipping | Self::Confirmation => None,
        }
    }

    /// Short label for logs and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

impl Serialize for WizardStep {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for WizardStep {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Self::from_number(n)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid wizard step: {n}")))
    }
}
