//! User registration and authentication

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::db::repositories::{TokenRepository, UserRepository};
use crate::models::{OutstandingToken, User};
use crate::services::jwt::{self, Claims, TokenPair};
use crate::services::password;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("A user with this email already exists")]
    EmailTaken,
    #[error("Invalid credentials")]
    AuthenticationError,
    #[error("Database error: {0}")]
    DatabaseError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    token_repository: Arc<dyn TokenRepository>,
    auth: AuthConfig,
}

impl UserService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn TokenRepository>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            auth,
        }
    }

    /// Register a new account from an already-validated email and password.
    ///
    /// The wire-level checks (email shape, password strength, confirmation
    /// match) happen at the API boundary; this enforces uniqueness and
    /// stores the Argon2 hash.
    pub async fn register(&self, email: &str, raw_password: &str) -> Result<User, UserServiceError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }
        if raw_password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if self.user_repository.email_exists(&email).await? {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = password::hash_password(raw_password)
            .map_err(UserServiceError::DatabaseError)?;
        let user = User::new(email, password_hash);
        self.user_repository.create(&user).await?;

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// Both tokens are recorded in the issued-token ledger. If recording
    /// the second entry fails, the first is deleted again so the ledger
    /// never holds half a pair.
    pub async fn authenticate(
        &self,
        email: &str,
        raw_password: &str,
    ) -> Result<TokenPair, UserServiceError> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repository
            .get_by_email(&email)
            .await?
            .ok_or(UserServiceError::AuthenticationError)?;

        if !user.is_active {
            return Err(UserServiceError::AuthenticationError);
        }

        let verified = password::verify_password(raw_password, &user.password_hash)
            .map_err(UserServiceError::DatabaseError)?;
        if !verified {
            return Err(UserServiceError::AuthenticationError);
        }

        let pair = jwt::issue_pair(&self.auth, &user).map_err(UserServiceError::DatabaseError)?;

        self.token_repository
            .create(&ledger_entry(&pair.refresh, &pair.refresh_claims))
            .await?;

        if let Err(err) = self
            .token_repository
            .create(&ledger_entry(&pair.access, &pair.access_claims))
            .await
        {
            warn!(user_id = %user.id, "Rolling back refresh ledger entry after failure");
            if let Err(cleanup_err) = self
                .token_repository
                .delete_by_jti(&pair.refresh_claims.jti)
                .await
            {
                warn!(error = %cleanup_err, "Failed to clean up refresh ledger entry");
            }
            return Err(UserServiceError::DatabaseError(err));
        }

        info!(user_id = %user.id, "Issued token pair");
        Ok(pair)
    }
}

fn ledger_entry(token: &str, claims: &Claims) -> OutstandingToken {
    OutstandingToken {
        jti: claims.jti.clone(),
        token: token.to_string(),
        user_id: claims.sub,
        created_at: chrono::Utc::now(),
        expires_at: claims.expires_at(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTokenRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    fn test_auth() -> AuthConfig {
        AuthConfig {
            secret: "secreto-de-prueba".to_string(),
            access_lifetime_minutes: 30,
            refresh_lifetime_days: 1,
        }
    }

    async fn test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool),
            test_auth(),
        )
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let service = test_service().await;

        let user = service
            .register("ana@example.com", "Contrasena.123")
            .await
            .expect("Failed to register");
        assert_eq!(user.email, "ana@example.com");
        assert!(user.is_active);

        let pair = service
            .authenticate("ana@example.com", "Contrasena.123")
            .await
            .expect("Failed to authenticate");
        assert!(!pair.access.is_empty());
        assert!(!pair.refresh.is_empty());
    }

    #[tokio::test]
    async fn test_register_normalizes_email_case() {
        let service = test_service().await;

        let user = service
            .register("  Ana@Example.COM ", "Contrasena.123")
            .await
            .unwrap();
        assert_eq!(user.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let service = test_service().await;

        service
            .register("ana@example.com", "Contrasena.123")
            .await
            .unwrap();
        let result = service.register("ana@example.com", "Otra.456").await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password() {
        let service = test_service().await;

        service
            .register("ana@example.com", "Contrasena.123")
            .await
            .unwrap();
        let result = service.authenticate("ana@example.com", "incorrecta").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_email() {
        let service = test_service().await;

        let result = service.authenticate("nadie@example.com", "loquesea").await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError)));
    }

    #[tokio::test]
    async fn test_authenticate_records_both_tokens() {
        let service = test_service().await;

        service
            .register("ana@example.com", "Contrasena.123")
            .await
            .unwrap();
        let pair = service
            .authenticate("ana@example.com", "Contrasena.123")
            .await
            .unwrap();

        let access = service
            .token_repository
            .get_by_jti(&pair.access_claims.jti)
            .await
            .unwrap();
        let refresh = service
            .token_repository
            .get_by_jti(&pair.refresh_claims.jti)
            .await
            .unwrap();
        assert!(access.is_some());
        assert!(refresh.is_some());
    }
}
