//! Issued-JWT ledger model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A JWT that has been issued and not yet expired or revoked.
///
/// One record per issued token (access and refresh alike), keyed by the
/// token's `jti` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingToken {
    /// JWT ID claim
    pub jti: String,
    /// The encoded token
    pub token: String,
    /// Owning user
    pub user_id: Uuid,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// Expiration taken from the `exp` claim
    pub expires_at: DateTime<Utc>,
}

impl OutstandingToken {
    /// Check whether the token has passed its expiration.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
