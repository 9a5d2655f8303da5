//! User repository
//!
//! Database operations for user accounts. Writes surface errors to the
//! caller; user creation failures become HTTP 500 at the API layer.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn create(&self, user: &User) -> Result<()>;

    /// Get a user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Check whether an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool>;
}

/// SQLx-based user repository supporting SQLite and MySQL.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

const INSERT_USER: &str = r#"
    INSERT INTO users (id, email, password_hash, dni, full_name, phone_number,
                       is_active, is_staff, is_superuser, date_joined)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_USER_BY_EMAIL: &str = r#"
    SELECT id, email, password_hash, dni, full_name, phone_number,
           is_active, is_staff, is_superuser, date_joined
    FROM users
    WHERE email = ?
"#;

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(INSERT_USER)
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.dni)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.date_joined)
        .execute(pool)
        .await
        .context("Failed to insert user")?;
    Ok(())
}

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<()> {
    sqlx::query(INSERT_USER)
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.dni)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.date_joined)
        .execute(pool)
        .await
        .context("Failed to insert user")?;
    Ok(())
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(SELECT_USER_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(SELECT_USER_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

fn row_to_user_sqlite(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    Ok(User {
        id: Uuid::parse_str(&id).context("Malformed user id in database")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        dni: row.try_get("dni")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn row_to_user_mysql(row: &MySqlRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    Ok(User {
        id: Uuid::parse_str(&id).context("Malformed user id in database")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        dni: row.try_get("dni")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        date_joined: row.try_get("date_joined")?,
    })
}
