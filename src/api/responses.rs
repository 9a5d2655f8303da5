//! Shared API response types
//!
//! Listing representations promote the identifying fields to the top level
//! and nest everything else under `features`. Responses for the search
//! endpoint wrap a page of listings with count and cursor links.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::Property;

/// A single listing representation.
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub id: String,
    pub type_property: String,
    pub short_description: String,
    pub long_description: String,
    pub features: Map<String, Value>,
}

impl From<&Property> for PropertyResponse {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id.to_string(),
            type_property: property.type_property.to_string(),
            short_description: property.short_description.clone(),
            long_description: property.long_description.clone(),
            features: build_features(property),
        }
    }
}

/// Paginated search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<PropertyResponse>,
}

/// Collect every non-null attribute that is not promoted to the top level.
/// The price is rendered as a 2-decimal string.
fn build_features(property: &Property) -> Map<String, Value> {
    let mut features = Map::new();
    features.insert(
        "availability_type".to_string(),
        Value::String(property.availability_type.to_string()),
    );
    if let Some(rooms) = property.rooms {
        features.insert("rooms".to_string(), Value::from(rooms));
    }
    if let Some(bathrooms) = property.bathrooms {
        features.insert("bathrooms".to_string(), Value::from(bathrooms));
    }
    if let Some(floors) = property.floors {
        features.insert("floors".to_string(), Value::from(floors));
    }
    if let Some(ambient) = &property.ambient {
        features.insert("ambient".to_string(), ambient.clone());
    }
    if let Some(rules) = &property.rules {
        features.insert("rules".to_string(), rules.clone());
    }
    if let Some(type_local) = property.type_local {
        features.insert(
            "type_local".to_string(),
            Value::String(type_local.to_string()),
        );
    }
    if let Some(extra_services) = &property.extra_services {
        features.insert("extra_services".to_string(), extra_services.clone());
    }
    if let Some(building_services) = &property.building_services {
        features.insert("building_services".to_string(), building_services.clone());
    }
    if let Some(uses) = &property.uses {
        features.insert("uses".to_string(), uses.clone());
    }
    if let Some(parking_lot) = property.parking_lot {
        features.insert("parking_lot".to_string(), Value::Bool(parking_lot));
    }
    if let Some(garages) = property.garages {
        features.insert("garages".to_string(), Value::Bool(garages));
    }
    if let Some(garden) = property.garden {
        features.insert("garden".to_string(), Value::Bool(garden));
    }
    if let Some(covered_meters) = property.covered_meters {
        features.insert("covered_meters".to_string(), Value::from(covered_meters));
    }
    if let Some(discovered_meters) = property.discovered_meters {
        features.insert(
            "discovered_meters".to_string(),
            Value::from(discovered_meters),
        );
    }
    features.insert(
        "location".to_string(),
        Value::String(property.location.clone()),
    );
    if let Some(location_in) = &property.location_in {
        features.insert(
            "location_in".to_string(),
            Value::String(location_in.clone()),
        );
    }
    features.insert(
        "price_usd".to_string(),
        Value::String(format!("{:.2}", property.price_usd)),
    );
    features.insert(
        "date_joined".to_string(),
        Value::String(property.date_joined.to_rfc3339()),
    );
    features
}
