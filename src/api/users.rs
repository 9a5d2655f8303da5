//! User API endpoints
//!
//! Handles HTTP requests for account management:
//! - POST /user/ - Account registration
//! - POST /user/auth/ - Credential exchange for an access/refresh pair

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ValidationDetails};
use crate::api::AppState;
use crate::services::user::UserServiceError;

/// Maximum stored email length.
const MAX_EMAIL_LEN: usize = 100;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9]+[-_.])*[A-Za-z0-9]+@[A-Za-z]+(\.[A-Z|a-z]{2,4}){1,2}$")
        .unwrap_or_else(|e| panic!("invalid email regex: {}", e))
});

/// Request body for account registration.
///
/// Fields are optional at the deserialization layer so that absences are
/// reported per field instead of failing the whole body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Request body for credential exchange
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for a successful credential exchange
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// A body that never deserialized (malformed JSON, wrong field type)
/// still answers the `{code_error, details}` 400 shape.
fn invalid_body(rejection: JsonRejection) -> ApiError {
    let mut details = ValidationDetails::new();
    details.add("non_field_errors", rejection.body_text());
    details.into_error()
}

/// Record an absence and pass present values through.
fn required<'a>(
    details: &mut ValidationDetails,
    field: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value {
        Some(value) => Some(value.as_str()),
        None => {
            details.add(field, "This field is required.");
            None
        }
    }
}

/// POST /user/ - Account registration
///
/// Validates the email shape, password strength and confirmation before
/// handing off to the user service. Succeeds with 201 and an empty body.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload.map_err(invalid_body)?;
    let mut details = ValidationDetails::new();

    let email = required(&mut details, "email", &body.email).map(str::trim);
    let password = required(&mut details, "password", &body.password);
    let confirm_password = required(&mut details, "confirm_password", &body.confirm_password);

    if let Some(email) = email {
        if email.is_empty() {
            details.add("email", "This field may not be blank.");
        } else {
            if email.len() > MAX_EMAIL_LEN {
                details.add(
                    "email",
                    format!(
                        "Ensure this field has no more than {} characters.",
                        MAX_EMAIL_LEN
                    ),
                );
            }
            if !EMAIL_REGEX.is_match(email) {
                details.add("email", "Enter a valid email address.");
            }
        }
    }

    if let Some(password) = password {
        if password.len() < MIN_PASSWORD_LEN {
            details.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LEN
                ),
            );
        }
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            details.add("password", "This password is entirely numeric.");
        }
        if let Some(confirm_password) = confirm_password {
            if confirm_password != password {
                details.add("confirm_password", "The two password fields didn't match.");
            }
        }
    }

    let (email, password) = match (email, password) {
        (Some(email), Some(password)) if details.is_empty() => (email, password),
        _ => return Err(details.into_error()),
    };

    match state.user_service.register(email, password).await {
        Ok(_) => Ok(StatusCode::CREATED),
        Err(UserServiceError::EmailTaken) => {
            let mut details = ValidationDetails::new();
            details.add("email", "A user with this email already exists.");
            Err(details.into_error())
        }
        Err(UserServiceError::ValidationError(msg)) => {
            let mut details = ValidationDetails::new();
            details.add("non_field_errors", msg);
            Err(details.into_error())
        }
        Err(e) => Err(ApiError::database_error(e.to_string())),
    }
}

/// POST /user/auth/ - Credential exchange
///
/// Returns `{access, refresh}` on success. Bad credentials and inactive
/// accounts both answer 401; a ledger write failure answers 500 after the
/// sibling record has been cleaned up.
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let Json(body) = payload.map_err(invalid_body)?;
    let mut details = ValidationDetails::new();

    let email = required(&mut details, "email", &body.email).map(str::trim);
    let password = required(&mut details, "password", &body.password);

    if email == Some("") {
        details.add("email", "This field may not be blank.");
    }
    if password == Some("") {
        details.add("password", "This field may not be blank.");
    }

    let (email, password) = match (email, password) {
        (Some(email), Some(password)) if details.is_empty() => (email, password),
        _ => return Err(details.into_error()),
    };

    match state.user_service.authenticate(email, password).await {
        Ok(pair) => Ok(Json(TokenPairResponse {
            access: pair.access,
            refresh: pair.refresh,
        })),
        Err(UserServiceError::AuthenticationError) => Err(ApiError::invalid_credentials()),
        Err(e) => Err(ApiError::database_error(e.to_string())),
    }
}
