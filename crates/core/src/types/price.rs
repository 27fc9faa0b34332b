//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are kept at full precision; rounding to two places happens only
/// when the price is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a USD price.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Amount rounded half-away-from-zero to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-{}{:.2}", self.currency_code.symbol(), rounded.abs())
        } else {
            write!(f, "{}{:.2}", self.currency_code.symbol(), rounded)
        }
    }
}

/// ISO 4217 currency codes. The storefront only sells in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::usd(Decimal::new(108, 0)).display(), "$108.00");
        assert_eq!(Price::usd(Decimal::new(35828, 2)).display(), "$358.28");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        // 10.285 -> 10.29
        assert_eq!(Price::usd(Decimal::new(10285, 3)).display(), "$10.29");
        // 10.284 -> 10.28
        assert_eq!(Price::usd(Decimal::new(10284, 3)).display(), "$10.28");
    }

    #[test]
    fn test_display_negative_amount() {
        assert_eq!(Price::usd(Decimal::new(-550, 2)).display(), "-$5.50");
    }

    #[test]
    fn test_usd_is_default_currency() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::USD);
        let price = serde_json::to_value(Price::usd(Decimal::ONE)).unwrap();
        assert_eq!(price["currency_code"], "USD");
    }
}
