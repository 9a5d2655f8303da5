//! Issued-JWT ledger repository
//!
//! Records every issued token by its `jti` claim and deletes records again
//! when the sibling token of a pair fails to persist. A ledger write failure
//! aborts the login that triggered it.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::OutstandingToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Token ledger repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Record an issued token
    async fn create(&self, token: &OutstandingToken) -> Result<()>;

    /// Look up a ledger record by jti
    async fn get_by_jti(&self, jti: &str) -> Result<Option<OutstandingToken>>;

    /// Delete a ledger record by jti
    async fn delete_by_jti(&self, jti: &str) -> Result<()>;
}

/// SQLx-based token ledger repository supporting SQLite and MySQL.
pub struct SqlxTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxTokenRepository {
    /// Create a new SQLx token repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_TOKEN: &str = r#"
    INSERT INTO outstanding_tokens (jti, token, user_id, created_at, expires_at)
    VALUES (?, ?, ?, ?, ?)
"#;

const SELECT_TOKEN_BY_JTI: &str = r#"
    SELECT jti, token, user_id, created_at, expires_at
    FROM outstanding_tokens
    WHERE jti = ?
"#;

const DELETE_TOKEN_BY_JTI: &str = "DELETE FROM outstanding_tokens WHERE jti = ?";

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn create(&self, token: &OutstandingToken) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_token_sqlite(self.pool.as_sqlite().unwrap(), token).await
            }
            DatabaseDriver::Mysql => create_token_mysql(self.pool.as_mysql().unwrap(), token).await,
        }
    }

    async fn get_by_jti(&self, jti: &str) -> Result<Option<OutstandingToken>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(SELECT_TOKEN_BY_JTI)
                    .bind(jti)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get token by jti")?;
                match row {
                    Some(row) => Ok(Some(row_to_token_sqlite(&row)?)),
                    None => Ok(None),
                }
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(SELECT_TOKEN_BY_JTI)
                    .bind(jti)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get token by jti")?;
                match row {
                    Some(row) => Ok(Some(row_to_token_mysql(&row)?)),
                    None => Ok(None),
                }
            }
        }
    }

    async fn delete_by_jti(&self, jti: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(DELETE_TOKEN_BY_JTI)
                    .bind(jti)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete token")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(DELETE_TOKEN_BY_JTI)
                    .bind(jti)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete token")?;
            }
        }
        Ok(())
    }
}

async fn create_token_sqlite(pool: &SqlitePool, token: &OutstandingToken) -> Result<()> {
    sqlx::query(INSERT_TOKEN)
        .bind(&token.jti)
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(pool)
        .await
        .context("Failed to record issued token")?;
    Ok(())
}

async fn create_token_mysql(pool: &MySqlPool, token: &OutstandingToken) -> Result<()> {
    sqlx::query(INSERT_TOKEN)
        .bind(&token.jti)
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(pool)
        .await
        .context("Failed to record issued token")?;
    Ok(())
}

fn row_to_token_sqlite(row: &SqliteRow) -> Result<OutstandingToken> {
    let user_id: String = row.try_get("user_id")?;
    Ok(OutstandingToken {
        jti: row.try_get("jti")?,
        token: row.try_get("token")?,
        user_id: Uuid::parse_str(&user_id).context("Malformed user id in ledger")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn row_to_token_mysql(row: &MySqlRow) -> Result<OutstandingToken> {
    let user_id: String = row.try_get("user_id")?;
    Ok(OutstandingToken {
        jti: row.try_get("jti")?,
        token: row.try_get("token")?,
        user_id: Uuid::parse_str(&user_id).context("Malformed user id in ledger")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::UserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use chrono::{Duration, Utc};

    async fn setup() -> (SqlxTokenRepository, Uuid) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user = User::new("token-owner@example.com".into(), "$argon2id$stub".into());
        crate::db::repositories::SqlxUserRepository::new(pool.clone())
            .create(&user)
            .await
            .expect("Failed to create user");

        (SqlxTokenRepository::new(pool), user.id)
    }

    fn ledger_entry(user_id: Uuid, jti: &str) -> OutstandingToken {
        OutstandingToken {
            jti: jti.to_string(),
            token: "header.payload.signature".to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, user_id) = setup().await;
        let entry = ledger_entry(user_id, "jti-1");
        repo.create(&entry).await.expect("Failed to record token");

        let found = repo
            .get_by_jti("jti-1")
            .await
            .expect("query failed")
            .expect("ledger record missing");
        assert_eq!(found.user_id, user_id);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_delete_by_jti() {
        let (repo, user_id) = setup().await;
        repo.create(&ledger_entry(user_id, "jti-2")).await.unwrap();
        repo.delete_by_jti("jti-2").await.unwrap();
        assert!(repo.get_by_jti("jti-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_jti_is_rejected() {
        let (repo, user_id) = setup().await;
        repo.create(&ledger_entry(user_id, "jti-3")).await.unwrap();
        assert!(repo.create(&ledger_entry(user_id, "jti-3")).await.is_err());
    }
}
