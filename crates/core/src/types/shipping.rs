//! Shipping methods and their flat-rate cost table.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shipping speed chosen during checkout.
///
/// Each method carries a fixed flat cost used only by the checkout total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// Flat shipping cost in USD.
    ///
    /// `STANDARD` is 5.00 and `EXPRESS` is 15.00.
    #[must_use]
    pub const fn cost(&self) -> Decimal {
        match self {
            Self::Standard => Decimal::from_parts(500, 0, 0, false, 2),
            Self::Express => Decimal::from_parts(1500, 0, 0, false, 2),
        }
    }

    /// Wire name as stored by the order service.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Express => "EXPRESS",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "EXPRESS" => Ok(Self::Express),
            _ => Err(format!("invalid shipping method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_costs() {
        assert_eq!(ShippingMethod::Standard.cost(), Decimal::new(5, 0));
        assert_eq!(ShippingMethod::Express.cost(), Decimal::new(15, 0));
    }

    #[test]
    fn test_default_is_standard() {
        assert_eq!(ShippingMethod::default(), ShippingMethod::Standard);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(
            "express".parse::<ShippingMethod>().unwrap(),
            ShippingMethod::Express
        );
        assert!("overnight".parse::<ShippingMethod>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&ShippingMethod::Express).unwrap();
        assert_eq!(json, "\"EXPRESS\"");
        let back: ShippingMethod = serde_json::from_str("\"STANDARD\"").unwrap();
        assert_eq!(back, ShippingMethod::Standard);
    }
}
