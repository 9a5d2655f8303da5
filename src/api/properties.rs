//! Listing API endpoints
//!
//! Handles HTTP requests for the listing catalogue:
//! - GET /property/search/ - Filtered search across the listing tables
//! - GET /property/{type_property}/{id}/ - Single listing retrieval

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::api::common::{self, page_link, paginate};
use crate::api::error::{ApiError, ValidationDetails};
use crate::api::responses::{PropertyResponse, SearchResponse};
use crate::api::AppState;
use crate::models::{AvailabilityType, LocalType, PropertyType};
use crate::services::filters::{FilterEntry, FilterMap};

const SEARCH_PATH: &str = "/property/search/";

/// `min_max` price token: two amounts up to 300000, at most 2 decimals each.
static PRICE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,5}(?:\.\d{1,2})?|300000)_(?:\d{1,5}(?:\.\d{1,2})?|300000)$")
        .unwrap_or_else(|e| panic!("invalid price regex: {}", e))
});

/// Room-count style token: a digit 1-5, or `0_5` for "more than five".
static COUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[1-5]|0_5)$").unwrap_or_else(|e| panic!("invalid count regex: {}", e))
});

/// GET /property/search/ - Filtered listing search
///
/// Query parameters are repeatable; all of them together must name at
/// least two distinct parameters. Zero matches map to 404 with an empty
/// body.
pub async fn search_properties(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in &params {
        grouped.entry(key.clone()).or_default().push(value.clone());
    }

    validate_search_params(&grouped)?;

    let page = match grouped.remove("page") {
        Some(values) => parse_page(&values)?,
        None => common::default_page(),
    };

    let filters: FilterMap = grouped
        .into_iter()
        .map(|(field, values)| (field, FilterEntry::Raw(values)))
        .collect();

    let results = state.search_service.search(filters).await.map_err(|e| {
        let mut details = ValidationDetails::new();
        details.add(e.field(), e.to_string());
        details.into_path_error()
    })?;

    if results.is_empty() {
        return Err(ApiError::not_found());
    }

    let window = paginate(results.len(), page, state.page_size);
    // A page past the last one is "not there", same as zero matches
    if window.start >= window.count {
        return Err(ApiError::not_found());
    }
    Ok(Json(SearchResponse {
        count: window.count,
        next: window.next.map(|n| page_link(SEARCH_PATH, &params, n)),
        previous: window.previous.map(|p| page_link(SEARCH_PATH, &params, p)),
        results: results[window.start..window.end]
            .iter()
            .map(PropertyResponse::from)
            .collect(),
    }))
}

/// GET /property/{type_property}/{id}/ - Single listing retrieval
pub async fn get_property(
    State(state): State<AppState>,
    Path((type_property, id)): Path<(String, String)>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let mut details = ValidationDetails::new();
    let kind = type_property.parse::<PropertyType>();
    if kind.is_err() {
        details.add(
            "type_property",
            format!("'{}' is not a valid property type.", type_property),
        );
    }
    let parsed_id = Uuid::parse_str(&id);
    if parsed_id.is_err() {
        details.add("id", format!("'{}' is not a valid UUID.", id));
    }
    let (kind, parsed_id) = match (kind, parsed_id) {
        (Ok(kind), Ok(parsed_id)) => (kind, parsed_id),
        _ => return Err(details.into_path_error()),
    };

    let property = match state.property_service.get(kind, parsed_id).await {
        Ok(property) => property,
        Err(e) => {
            // Read-path failures degrade to not-found rather than a 500
            warn!(error = %e, "Listing retrieval failed");
            None
        }
    };

    property
        .map(|p| Json(PropertyResponse::from(&p)))
        .ok_or_else(ApiError::not_found)
}

/// Validate choice fields and numeric token shapes before normalization.
fn validate_search_params(grouped: &BTreeMap<String, Vec<String>>) -> Result<(), ApiError> {
    let mut details = ValidationDetails::new();

    if grouped.len() < 2 {
        details.add(
            "non_field_errors",
            "At least two query parameters are required.",
        );
    }

    match grouped.get("type_property") {
        None => details.add("type_property", "This parameter is required."),
        Some(values) => {
            for value in values {
                if value.parse::<PropertyType>().is_err() {
                    details.add(
                        "type_property",
                        format!("'{}' is not a valid choice.", value),
                    );
                }
            }
        }
    }

    if let Some(values) = grouped.get("availability_type") {
        for value in values {
            if value.parse::<AvailabilityType>().is_err() {
                details.add(
                    "availability_type",
                    format!("'{}' is not a valid choice.", value),
                );
            }
        }
    }

    if let Some(values) = grouped.get("type_local") {
        for value in values {
            if value.parse::<LocalType>().is_err() {
                details.add("type_local", format!("'{}' is not a valid choice.", value));
            }
        }
    }

    for field in ["rooms", "bathrooms", "floors"] {
        if let Some(values) = grouped.get(field) {
            for value in values {
                if !COUNT_REGEX.is_match(value) {
                    details.add(
                        field,
                        format!("'{}' must be a count from 1 to 5, or 0_5.", value),
                    );
                }
            }
        }
    }

    if let Some(values) = grouped.get("price_usd") {
        for value in values {
            if !PRICE_REGEX.is_match(value) {
                details.add(
                    "price_usd",
                    format!("'{}' is not a valid min_max price.", value),
                );
            } else if let Some((min, max)) = parse_price_bounds(value) {
                if min != 0.0 && max != 0.0 && min >= max {
                    details.add(
                        "price_usd",
                        "The minimum price must be lower than the maximum.",
                    );
                }
            }
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(details.into_path_error())
    }
}

fn parse_price_bounds(token: &str) -> Option<(f64, f64)> {
    let (min, max) = token.split_once('_')?;
    Some((min.parse().ok()?, max.parse().ok()?))
}

fn parse_page(values: &[String]) -> Result<usize, ApiError> {
    let raw = values.first().map(String::as_str).unwrap_or("1");
    match raw.parse::<usize>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => {
            let mut details = ValidationDetails::new();
            details.add("page", format!("'{}' is not a valid page number.", raw));
            Err(details.into_path_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::spawn_test_server;
    use crate::db::repositories::test_support::{insert_department, insert_home, insert_local};
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    async fn test_search_filters_by_variant_and_fields() {
        let (server, pool) = spawn_test_server().await;
        insert_home(&pool, "Casa uno", AvailabilityType::Rent, 3, 220.0).await;
        insert_home(&pool, "Casa dos", AvailabilityType::Rent, 3, 400.0).await;
        insert_home(&pool, "Casa tres", AvailabilityType::Buy, 3, 220.0).await;
        insert_department(&pool, "Depto", AvailabilityType::Rent, 3, 220.0).await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("availability_type", "Alquiler")
            .add_query_param("rooms", "3")
            .add_query_param("price_usd", "199.00_256.00")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["short_description"], "Casa uno");
        assert_eq!(body["results"][0]["features"]["price_usd"], "220.00");
    }

    #[tokio::test]
    async fn test_search_zero_matches_returns_404_empty_body() {
        let (server, pool) = spawn_test_server().await;
        insert_home(&pool, "Casa", AvailabilityType::Buy, 3, 220.0).await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("availability_type", "Alquiler")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.as_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_two_parameters() {
        let (server, _pool) = spawn_test_server().await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code_error"], "invalid_path_params");
        assert!(body["details"]["non_field_errors"].is_array());
    }

    #[tokio::test]
    async fn test_search_rejects_bad_choice_and_price() {
        let (server, _pool) = spawn_test_server().await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Castillo")
            .add_query_param("price_usd", "300_200")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code_error"], "invalid_path_params");
        assert!(body["details"]["type_property"].is_array());
        assert!(body["details"]["price_usd"].is_array());
    }

    #[tokio::test]
    async fn test_search_rejects_room_token_out_of_range() {
        let (server, _pool) = spawn_test_server().await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("rooms", "7")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["details"]["rooms"].is_array());
    }

    #[tokio::test]
    async fn test_search_return_all_counts_targeted_tables() {
        let (server, pool) = spawn_test_server().await;
        insert_home(&pool, "Casa", AvailabilityType::Rent, 3, 220.0).await;
        insert_department(&pool, "Depto", AvailabilityType::Rent, 2, 150.0).await;
        insert_local(&pool, "Local", LocalType::Commercial, true, 500.0).await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("type_property", "Local")
            .add_query_param("all", "true")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_search_paginates_with_cursor_links() {
        let (server, pool) = spawn_test_server().await;
        for i in 0..13 {
            insert_home(
                &pool,
                &format!("Casa {}", i),
                AvailabilityType::Rent,
                3,
                200.0,
            )
            .await;
        }

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("rooms", "3")
            .add_query_param("page", "2")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["count"], 13);
        assert_eq!(body["results"].as_array().map(Vec::len), Some(3));
        assert!(body["next"].is_null());
        let previous = body["previous"].as_str().expect("Expected previous link");
        assert!(previous.starts_with("/property/search/?"));
        assert!(previous.contains("page=1"));
    }

    #[tokio::test]
    async fn test_get_property_by_id() {
        let (server, pool) = spawn_test_server().await;
        let id = insert_home(&pool, "Casa quinta", AvailabilityType::Buy, 4, 310.0).await;

        let response = server.get(&format!("/property/Casa/{}/", id)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], id.to_string());
        assert_eq!(body["type_property"], "Casa");
        assert_eq!(body["features"]["rooms"], 4);
    }

    #[tokio::test]
    async fn test_get_property_unknown_id_returns_404() {
        let (server, _pool) = spawn_test_server().await;

        let response = server
            .get(&format!("/property/Casa/{}/", Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.as_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_get_property_bad_type_and_id_returns_400() {
        let (server, _pool) = spawn_test_server().await;

        let response = server.get("/property/Castillo/not-a-uuid/").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code_error"], "invalid_path_params");
        assert!(body["details"]["type_property"].is_array());
        assert!(body["details"]["id"].is_array());
    }

    #[tokio::test]
    async fn test_search_page_past_the_end_returns_404() {
        let (server, pool) = spawn_test_server().await;
        insert_home(&pool, "Casa", AvailabilityType::Rent, 3, 200.0).await;
        insert_home(&pool, "Casa dos", AvailabilityType::Rent, 3, 210.0).await;

        let response = server
            .get("/property/search/")
            .add_query_param("type_property", "Casa")
            .add_query_param("rooms", "3")
            .add_query_param("page", "3")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.as_bytes().is_empty());
    }
}
