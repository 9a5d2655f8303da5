//! User model
//!
//! Users register with an email and password and authenticate to obtain a
//! JWT pair. Email is the unique login identifier; the optional personal
//! fields are filled in later through out-of-band processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email address (unique, login identifier)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// National identity document number
    pub dni: Option<String>,
    /// Full name
    pub full_name: Option<String>,
    /// Phone number
    pub phone_number: Option<String>,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// Staff flag
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
    /// Registration timestamp
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new user from an email and an already-hashed password.
    ///
    /// Regular registrations start active and without staff privileges.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            dni: None,
            full_name: None,
            phone_number: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("ana@example.com".into(), "$argon2id$stub".into());
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
        assert!(user.dni.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("ana@example.com".into(), "$argon2id$stub".into());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }
}
