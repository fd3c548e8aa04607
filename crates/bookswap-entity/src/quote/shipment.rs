//! Shipment request sent to courier providers.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A street address in South Africa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Address {
    /// Street and number.
    #[validate(length(min = 1))]
    pub street: String,
    /// Suburb.
    #[validate(length(min = 1))]
    pub suburb: String,
    /// City or town.
    #[validate(length(min = 1))]
    pub city: String,
    /// Province.
    #[serde(default)]
    pub province: String,
    /// Four-digit postal code.
    #[validate(length(min = 4, max = 10))]
    pub postal_code: String,
    /// ISO country code.
    #[serde(default = "default_country")]
    pub country: String,
}

/// Parcel weight and dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Parcel {
    /// Actual weight in kilograms.
    #[validate(range(exclusive_min = 0.0, max = 70.0))]
    pub weight_kg: f64,
    /// Length in centimetres.
    #[validate(range(exclusive_min = 0.0))]
    pub length_cm: f64,
    /// Width in centimetres.
    #[validate(range(exclusive_min = 0.0))]
    pub width_cm: f64,
    /// Height in centimetres.
    #[validate(range(exclusive_min = 0.0))]
    pub height_cm: f64,
}

impl Parcel {
    /// A typical single-textbook parcel.
    pub fn textbook() -> Self {
        Self {
            weight_kg: 1.5,
            length_cm: 30.0,
            width_cm: 25.0,
            height_cm: 8.0,
        }
    }
}

/// Origin, destination and parcel of one shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShipmentRequest {
    /// Collection address (seller).
    #[validate(nested)]
    pub from: Address,
    /// Delivery address (buyer).
    #[validate(nested)]
    pub to: Address,
    /// The parcel.
    #[validate(nested)]
    pub parcel: Parcel,
}

fn default_country() -> String {
    "ZA".to_string()
}
