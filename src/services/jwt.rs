//! JWT issuance and verification
//!
//! Issues HS256-signed access/refresh token pairs and decodes them back
//! into claims. Every token carries a uuid `jti` so the issued-token
//! ledger can reference it.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::User;

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id
    pub sub: Uuid,
    /// User email, for convenience of API consumers
    pub email: String,
    /// Token id, referenced by the ledger
    pub jti: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Expiration as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// An issued access/refresh pair together with the decoded claims.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub access_claims: Claims,
    pub refresh: String,
    pub refresh_claims: Claims,
}

/// Issue an access/refresh pair for a user.
///
/// Lifetimes come from configuration; each token gets its own `jti`.
pub fn issue_pair(config: &AuthConfig, user: &User) -> Result<TokenPair> {
    let now = Utc::now();
    let (access, access_claims) = issue_token(
        config,
        user,
        "access",
        now,
        Duration::minutes(config.access_lifetime_minutes),
    )?;
    let (refresh, refresh_claims) = issue_token(
        config,
        user,
        "refresh",
        now,
        Duration::days(config.refresh_lifetime_days),
    )?;

    Ok(TokenPair {
        access,
        access_claims,
        refresh,
        refresh_claims,
    })
}

fn issue_token(
    config: &AuthConfig,
    user: &User,
    token_type: &str,
    now: DateTime<Utc>,
    lifetime: Duration,
) -> Result<(String, Claims)> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .context("Failed to sign token")?;

    Ok((token, claims))
}

/// Decode and validate a token, returning its claims.
pub fn decode_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode token")?;
    Ok(data.claims)
}
