//! Shipping draft entered on step 1.

use core::fmt;
use core::str::FromStr;

use gearline_core::ShippingMethod;
use serde::{Deserialize, Serialize};

/// Country used when the shopper has not picked one.
pub const DEFAULT_COUNTRY: &str = "US";

/// Shipping details, mutated field by field as the shopper types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub method: ShippingMethod,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            method: ShippingMethod::Standard,
        }
    }
}

/// Editable text fields of [`ShippingInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingField {
    Address,
    City,
    State,
    Zip,
    Country,
}

impl ShippingField {
    /// Fields that must be non-blank before leaving step 1.
    pub const REQUIRED: [Self; 4] = [Self::Address, Self::City, Self::State, Self::Zip];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Country => "country",
        }
    }
}

impl fmt::Display for ShippingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(Self::Address),
            "city" => Ok(Self::City),
            "state" => Ok(Self::State),
            "zip" => Ok(Self::Zip),
            "country" => Ok(Self::Country),
            _ => Err(format!("unknown shipping field: {s}")),
        }
    }
}

impl ShippingInfo {
    /// Current value of a text field.
    #[must_use]
    pub fn field(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::State => &self.state,
            ShippingField::Zip => &self.zip,
            ShippingField::Country => &self.country,
        }
    }

    /// Overwrite a text field. The value is stored as typed; trimming only
    /// matters for validation.
    pub fn set_field(&mut self, field: ShippingField, value: impl Into<String>) {
        let slot = match field {
            ShippingField::Address => &mut self.address,
            ShippingField::City => &mut self.city,
            ShippingField::State => &mut self.state,
            ShippingField::Zip => &mut self.zip,
            ShippingField::Country => &mut self.country,
        };
        *slot = value.into();
    }

    /// Required fields that are empty after trimming, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ShippingField> {
        ShippingField::REQUIRED
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }
}
