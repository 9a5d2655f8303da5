//! Property models
//!
//! Defines the three property variants (Home, Department, Local) served by
//! the listing API, together with the fixed enumerations used by the search
//! filter layer. All variants share a common set of base fields; fields that
//! do not apply to a variant are `None` and never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Property variant tag.
///
/// The wire values are the Spanish labels used by the seeded data
/// ("Casa", "Departamento", "Local").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "Casa")]
    Home,
    #[serde(rename = "Departamento")]
    Department,
    #[serde(rename = "Local")]
    Local,
}

impl PropertyType {
    /// All variants, in the order their tables are scanned.
    pub const ALL: [PropertyType; 3] = [
        PropertyType::Home,
        PropertyType::Department,
        PropertyType::Local,
    ];

    /// Database table backing this variant.
    pub fn table(&self) -> &'static str {
        match self {
            PropertyType::Home => "home",
            PropertyType::Department => "department",
            PropertyType::Local => "local",
        }
    }

    /// Columns of this variant's table that search filters may target.
    ///
    /// The search executor restricts each per-variant query to this set, so
    /// a filter on e.g. `garden` silently drops out of the Department query
    /// instead of producing invalid SQL.
    pub fn filterable_columns(&self) -> &'static [&'static str] {
        match self {
            PropertyType::Home => &[
                "availability_type",
                "rooms",
                "bathrooms",
                "floors",
                "garages",
                "garden",
                "price_usd",
                "covered_meters",
                "discovered_meters",
            ],
            PropertyType::Department => &[
                "availability_type",
                "rooms",
                "bathrooms",
                "floors",
                "price_usd",
                "covered_meters",
            ],
            PropertyType::Local => &[
                "availability_type",
                "type_local",
                "parking_lot",
                "price_usd",
            ],
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Home => write!(f, "Casa"),
            PropertyType::Department => write!(f, "Departamento"),
            PropertyType::Local => write!(f, "Local"),
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Casa" => Ok(PropertyType::Home),
            "Departamento" => Ok(PropertyType::Department),
            "Local" => Ok(PropertyType::Local),
            _ => Err(format!("unknown property type: {}", s)),
        }
    }
}

/// Availability of a listing: sale, rental or temporary rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityType {
    #[serde(rename = "Compra")]
    Buy,
    #[serde(rename = "Alquiler")]
    Rent,
    #[serde(rename = "Alquiler temporal")]
    TemporaryRental,
}

impl fmt::Display for AvailabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityType::Buy => write!(f, "Compra"),
            AvailabilityType::Rent => write!(f, "Alquiler"),
            AvailabilityType::TemporaryRental => write!(f, "Alquiler temporal"),
        }
    }
}

impl FromStr for AvailabilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Compra" => Ok(AvailabilityType::Buy),
            "Alquiler" => Ok(AvailabilityType::Rent),
            "Alquiler temporal" => Ok(AvailabilityType::TemporaryRental),
            _ => Err(format!("unknown availability type: {}", s)),
        }
    }
}

/// Sub-type of a Local property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalType {
    #[serde(rename = "Comercial")]
    Commercial,
    #[serde(rename = "Industrial")]
    Industrial,
}

impl fmt::Display for LocalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalType::Commercial => write!(f, "Comercial"),
            LocalType::Industrial => write!(f, "Industrial"),
        }
    }
}

impl FromStr for LocalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Comercial" => Ok(LocalType::Commercial),
            "Industrial" => Ok(LocalType::Industrial),
            _ => Err(format!("unknown local type: {}", s)),
        }
    }
}

/// A property listing.
///
/// Superset of the three variants' columns; `type_property` says which
/// variant a record is, and columns the variant does not carry stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier
    pub id: Uuid,
    /// Variant tag
    pub type_property: PropertyType,
    /// Short listing blurb
    pub short_description: String,
    /// Full listing description
    pub long_description: String,
    /// Sale / rental / temporary rental
    pub availability_type: AvailabilityType,
    /// Room count (Home, Department)
    pub rooms: Option<i64>,
    /// Bathroom count (Home, Department)
    pub bathrooms: Option<i64>,
    /// Floor count (Home, Department)
    pub floors: Option<i64>,
    /// Ambient descriptors, free-form JSON (Home, Department)
    pub ambient: Option<serde_json::Value>,
    /// House rules, free-form JSON (Home, Department)
    pub rules: Option<serde_json::Value>,
    /// Commercial or industrial (Local only)
    pub type_local: Option<LocalType>,
    /// Extra services included, free-form JSON
    pub extra_services: Option<serde_json::Value>,
    /// Building amenities, free-form JSON (Department only)
    pub building_services: Option<serde_json::Value>,
    /// Permitted uses, free-form JSON (Local only)
    pub uses: Option<serde_json::Value>,
    /// Whether a parking lot is available (Local only)
    pub parking_lot: Option<bool>,
    /// Whether garages are available (Home only)
    pub garages: Option<bool>,
    /// Whether a garden is present (Home only)
    pub garden: Option<bool>,
    /// Covered square meters (Home, Department)
    pub covered_meters: Option<f64>,
    /// Uncovered square meters (Home only)
    pub discovered_meters: Option<f64>,
    /// Street address (unique)
    pub location: String,
    /// Position within the building or lot (Local only)
    pub location_in: Option<String>,
    /// Price in USD
    pub price_usd: f64,
    /// Listing creation timestamp
    pub date_joined: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_round_trip() {
        for variant in PropertyType::ALL {
            let label = variant.to_string();
            assert_eq!(label.parse::<PropertyType>().unwrap(), variant);
        }
    }

    #[test]
    fn test_property_type_rejects_unknown_label() {
        assert!("Chalet".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_availability_labels_are_spanish() {
        assert_eq!(AvailabilityType::Buy.to_string(), "Compra");
        assert_eq!(AvailabilityType::Rent.to_string(), "Alquiler");
        assert_eq!(
            AvailabilityType::TemporaryRental.to_string(),
            "Alquiler temporal"
        );
    }

    #[test]
    fn test_filterable_columns_per_variant() {
        assert!(PropertyType::Home.filterable_columns().contains(&"garden"));
        assert!(!PropertyType::Department
            .filterable_columns()
            .contains(&"garden"));
        assert!(PropertyType::Local
            .filterable_columns()
            .contains(&"parking_lot"));
        assert!(!PropertyType::Local.filterable_columns().contains(&"rooms"));
    }
}
