//! Database migrations
//!
//! Code-based migrations embedded as SQL strings, with variants for SQLite
//! and MySQL so the backend runs from a single binary either way. Applied
//! versions are tracked in a `_migrations` ledger table.
//!
//! Each migration is a `Migration` struct carrying:
//! - `version`: unique version number for ordering
//! - `name`: human-readable migration name
//! - `up_sqlite` / `up_mysql`: dialect-specific DDL

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the listing backend, embedded in the binary.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: users table (email is the login identifier)
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id CHAR(36) PRIMARY KEY,
                email VARCHAR(100) NOT NULL UNIQUE,
                password_hash VARCHAR(128) NOT NULL,
                dni VARCHAR(8) UNIQUE,
                full_name VARCHAR(100) UNIQUE,
                phone_number VARCHAR(16) UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                is_superuser BOOLEAN NOT NULL DEFAULT 0,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id CHAR(36) PRIMARY KEY,
                email VARCHAR(100) NOT NULL UNIQUE,
                password_hash VARCHAR(128) NOT NULL,
                dni VARCHAR(8) UNIQUE,
                full_name VARCHAR(100) UNIQUE,
                phone_number VARCHAR(16) UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                is_superuser BOOLEAN NOT NULL DEFAULT 0,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    // Migration 2: issued-JWT ledger
    Migration {
        version: 2,
        name: "create_outstanding_tokens",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS outstanding_tokens (
                jti VARCHAR(64) PRIMARY KEY,
                token TEXT NOT NULL,
                user_id CHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                expires_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_outstanding_tokens_user_id ON outstanding_tokens(user_id);
            CREATE INDEX IF NOT EXISTS idx_outstanding_tokens_expires_at ON outstanding_tokens(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS outstanding_tokens (
                jti VARCHAR(64) PRIMARY KEY,
                token TEXT NOT NULL,
                user_id CHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                expires_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_outstanding_tokens_user_id ON outstanding_tokens(user_id);
            CREATE INDEX idx_outstanding_tokens_expires_at ON outstanding_tokens(expires_at);
        "#,
    },
    // Migration 3: home listings
    Migration {
        version: 3,
        name: "create_home",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS home (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Casa',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                rooms INTEGER NOT NULL,
                bathrooms INTEGER NOT NULL,
                floors INTEGER NOT NULL,
                ambient TEXT NOT NULL,
                rules TEXT NOT NULL,
                garages BOOLEAN NOT NULL,
                garden BOOLEAN NOT NULL,
                extra_services TEXT NOT NULL,
                covered_meters DOUBLE NOT NULL,
                discovered_meters DOUBLE NOT NULL,
                location VARCHAR(100) NOT NULL UNIQUE,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_home_availability_type ON home(availability_type);
            CREATE INDEX IF NOT EXISTS idx_home_rooms ON home(rooms);
            CREATE INDEX IF NOT EXISTS idx_home_price_usd ON home(price_usd);
            CREATE INDEX IF NOT EXISTS idx_home_date_joined ON home(date_joined);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS home (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Casa',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                rooms INT NOT NULL,
                bathrooms INT NOT NULL,
                floors INT NOT NULL,
                ambient JSON NOT NULL,
                rules JSON NOT NULL,
                garages BOOLEAN NOT NULL,
                garden BOOLEAN NOT NULL,
                extra_services JSON NOT NULL,
                covered_meters DOUBLE NOT NULL,
                discovered_meters DOUBLE NOT NULL,
                location VARCHAR(100) NOT NULL UNIQUE,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_home_availability_type ON home(availability_type);
            CREATE INDEX idx_home_rooms ON home(rooms);
            CREATE INDEX idx_home_price_usd ON home(price_usd);
            CREATE INDEX idx_home_date_joined ON home(date_joined);
        "#,
    },
    // Migration 4: department listings
    Migration {
        version: 4,
        name: "create_department",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS department (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Departamento',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                rooms INTEGER NOT NULL,
                bathrooms INTEGER NOT NULL,
                floors INTEGER NOT NULL,
                ambient TEXT NOT NULL,
                rules TEXT NOT NULL,
                covered_meters DOUBLE NOT NULL,
                extra_services TEXT NOT NULL,
                building_services TEXT NOT NULL,
                location VARCHAR(100) NOT NULL UNIQUE,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_department_availability_type ON department(availability_type);
            CREATE INDEX IF NOT EXISTS idx_department_rooms ON department(rooms);
            CREATE INDEX IF NOT EXISTS idx_department_price_usd ON department(price_usd);
            CREATE INDEX IF NOT EXISTS idx_department_date_joined ON department(date_joined);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS department (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Departamento',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                rooms INT NOT NULL,
                bathrooms INT NOT NULL,
                floors INT NOT NULL,
                ambient JSON NOT NULL,
                rules JSON NOT NULL,
                covered_meters DOUBLE NOT NULL,
                extra_services JSON NOT NULL,
                building_services JSON NOT NULL,
                location VARCHAR(100) NOT NULL UNIQUE,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_department_availability_type ON department(availability_type);
            CREATE INDEX idx_department_rooms ON department(rooms);
            CREATE INDEX idx_department_price_usd ON department(price_usd);
            CREATE INDEX idx_department_date_joined ON department(date_joined);
        "#,
    },
    // Migration 5: local listings
    Migration {
        version: 5,
        name: "create_local",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS local (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Local',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                type_local VARCHAR(25) NOT NULL,
                extra_services TEXT NOT NULL,
                uses TEXT NOT NULL,
                parking_lot BOOLEAN NOT NULL DEFAULT 0,
                location VARCHAR(100) NOT NULL UNIQUE,
                location_in VARCHAR(100) NOT NULL,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_local_availability_type ON local(availability_type);
            CREATE INDEX IF NOT EXISTS idx_local_type_local ON local(type_local);
            CREATE INDEX IF NOT EXISTS idx_local_price_usd ON local(price_usd);
            CREATE INDEX IF NOT EXISTS idx_local_date_joined ON local(date_joined);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS local (
                id CHAR(36) PRIMARY KEY,
                type_property VARCHAR(25) NOT NULL DEFAULT 'Local',
                short_description VARCHAR(50) NOT NULL,
                long_description VARCHAR(200) NOT NULL,
                availability_type VARCHAR(25) NOT NULL,
                type_local VARCHAR(25) NOT NULL,
                extra_services JSON NOT NULL,
                uses JSON NOT NULL,
                parking_lot BOOLEAN NOT NULL DEFAULT 0,
                location VARCHAR(100) NOT NULL UNIQUE,
                location_in VARCHAR(100) NOT NULL,
                price_usd DOUBLE NOT NULL,
                date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_local_availability_type ON local(availability_type);
            CREATE INDEX idx_local_type_local ON local(type_local);
            CREATE INDEX idx_local_price_usd ON local(price_usd);
            CREATE INDEX idx_local_date_joined ON local(date_joined);
        "#,
    },
];

/// Run all pending migrations, returning how many were applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Second run is a no-op
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_property_tables_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite = pool.as_sqlite().unwrap();
        for table in ["home", "department", "local", "users", "outstanding_tokens"] {
            let row = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table)
                .fetch_optional(sqlite)
                .await
                .expect("Failed to query sqlite_master");
            assert!(row.is_some(), "table '{}' missing", table);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (x INT);\n-- comment\nCREATE INDEX i ON a(x);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
    }
}
