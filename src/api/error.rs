//! API error responses
//!
//! Error bodies follow the `{code_error, details}` wire shape. Not-found
//! responses carry no body at all.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// An HTTP error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code_error: String,
    details: Value,
}

impl ApiError {
    /// 400 with `code_error: "invalid_data"` and a field → messages map.
    pub fn invalid_data(details: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: Some(ErrorBody {
                code_error: "invalid_data".to_string(),
                details,
            }),
        }
    }

    /// 400 with `code_error: "invalid_path_params"`, the code the listing
    /// endpoints use for bad path and query input.
    pub fn invalid_path_params(details: Value) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: Some(ErrorBody {
                code_error: "invalid_path_params".to_string(),
                details,
            }),
        }
    }

    /// 401 for bad credentials or an inactive account.
    pub fn invalid_credentials() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: Some(ErrorBody {
                code_error: "invalid_credentials".to_string(),
                details: Value::String(
                    "No active account found with the given credentials".to_string(),
                ),
            }),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: None,
        }
    }

    /// 500 with `code_error: "database_error"`.
    pub fn database_error(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Some(ErrorBody {
                code_error: "database_error".to_string(),
                details: Value::String(details.into()),
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// Accumulates per-field validation messages for a 400 response.
#[derive(Debug, Default)]
pub struct ValidationDetails {
    fields: serde_json::Map<String, Value>,
}

impl ValidationDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a field's list.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume into a 400 `invalid_data` error.
    pub fn into_error(self) -> ApiError {
        ApiError::invalid_data(Value::Object(self.fields))
    }

    /// Consume into a 400 `invalid_path_params` error.
    pub fn into_path_error(self) -> ApiError {
        ApiError::invalid_path_params(Value::Object(self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_details_accumulate_per_field() {
        let mut details = ValidationDetails::new();
        details.add("email", "Enter a valid email address.");
        details.add("email", "Email is too long.");
        details.add("password", "Too short.");

        let error = details.into_error();
        let body = error.body.expect("Expected a body");
        assert_eq!(body.code_error, "invalid_data");
        assert_eq!(body.details["email"].as_array().map(Vec::len), Some(2));
        assert_eq!(body.details["password"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_path_error_carries_its_own_code() {
        let mut details = ValidationDetails::new();
        details.add("id", "'x' is not a valid UUID.");

        let error = details.into_path_error();
        let body = error.body.expect("Expected a body");
        assert_eq!(body.code_error, "invalid_path_params");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_has_no_body() {
        let error = ApiError::not_found();
        assert!(error.body.is_none());
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
