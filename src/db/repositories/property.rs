//! Property repository
//!
//! Retrieval of a single property by variant and id. The three variant
//! tables share their base columns; the row mappers read variant-specific
//! columns opportunistically so one mapper covers all three tables.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Property, PropertyType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Property repository trait
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Fetch one property from the given variant's table.
    async fn get(&self, type_property: PropertyType, id: Uuid) -> Result<Option<Property>>;
}

/// SQLx-based property repository supporting SQLite and MySQL.
pub struct SqlxPropertyRepository {
    pool: DynDatabasePool,
}

impl SqlxPropertyRepository {
    /// Create a new SQLx property repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PropertyRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PropertyRepository for SqlxPropertyRepository {
    async fn get(&self, type_property: PropertyType, id: Uuid) -> Result<Option<Property>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_property_sqlite(self.pool.as_sqlite().unwrap(), type_property, id).await
            }
            DatabaseDriver::Mysql => {
                get_property_mysql(self.pool.as_mysql().unwrap(), type_property, id).await
            }
        }
    }
}

async fn get_property_sqlite(
    pool: &SqlitePool,
    type_property: PropertyType,
    id: Uuid,
) -> Result<Option<Property>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", type_property.table());
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get property by id")?;

    match row {
        Some(row) => Ok(Some(row_to_property_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_property_mysql(
    pool: &MySqlPool,
    type_property: PropertyType,
    id: Uuid,
) -> Result<Option<Property>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", type_property.table());
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get property by id")?;

    match row {
        Some(row) => Ok(Some(row_to_property_mysql(&row)?)),
        None => Ok(None),
    }
}

/// Map a SQLite row from any of the variant tables into a `Property`.
///
/// Variant-specific columns are read with `try_get().ok()` so a missing
/// column simply yields `None` instead of an error.
pub(crate) fn row_to_property_sqlite(row: &SqliteRow) -> Result<Property> {
    let id: String = row.try_get("id")?;
    let type_property: String = row.try_get("type_property")?;
    let availability_type: String = row.try_get("availability_type")?;
    let type_local: Option<String> = row.try_get("type_local").ok();

    Ok(Property {
        id: Uuid::parse_str(&id).context("Malformed property id in database")?,
        type_property: PropertyType::from_str(&type_property).map_err(anyhow::Error::msg)?,
        short_description: row.try_get("short_description")?,
        long_description: row.try_get("long_description")?,
        availability_type: FromStr::from_str(&availability_type).map_err(anyhow::Error::msg)?,
        rooms: row.try_get("rooms").ok(),
        bathrooms: row.try_get("bathrooms").ok(),
        floors: row.try_get("floors").ok(),
        ambient: row.try_get("ambient").ok(),
        rules: row.try_get("rules").ok(),
        type_local: match type_local {
            Some(value) => Some(FromStr::from_str(&value).map_err(anyhow::Error::msg)?),
            None => None,
        },
        extra_services: row.try_get("extra_services").ok(),
        building_services: row.try_get("building_services").ok(),
        uses: row.try_get("uses").ok(),
        parking_lot: row.try_get("parking_lot").ok(),
        garages: row.try_get("garages").ok(),
        garden: row.try_get("garden").ok(),
        covered_meters: row.try_get("covered_meters").ok(),
        discovered_meters: row.try_get("discovered_meters").ok(),
        location: row.try_get("location")?,
        location_in: row.try_get("location_in").ok(),
        price_usd: row.try_get("price_usd")?,
        date_joined: row.try_get("date_joined")?,
    })
}

/// Map a MySQL row from any of the variant tables into a `Property`.
pub(crate) fn row_to_property_mysql(row: &MySqlRow) -> Result<Property> {
    let id: String = row.try_get("id")?;
    let type_property: String = row.try_get("type_property")?;
    let availability_type: String = row.try_get("availability_type")?;
    let type_local: Option<String> = row.try_get("type_local").ok();

    Ok(Property {
        id: Uuid::parse_str(&id).context("Malformed property id in database")?,
        type_property: PropertyType::from_str(&type_property).map_err(anyhow::Error::msg)?,
        short_description: row.try_get("short_description")?,
        long_description: row.try_get("long_description")?,
        availability_type: FromStr::from_str(&availability_type).map_err(anyhow::Error::msg)?,
        rooms: row.try_get("rooms").ok(),
        bathrooms: row.try_get("bathrooms").ok(),
        floors: row.try_get("floors").ok(),
        ambient: row.try_get("ambient").ok(),
        rules: row.try_get("rules").ok(),
        type_local: match type_local {
            Some(value) => Some(FromStr::from_str(&value).map_err(anyhow::Error::msg)?),
            None => None,
        },
        extra_services: row.try_get("extra_services").ok(),
        building_services: row.try_get("building_services").ok(),
        uses: row.try_get("uses").ok(),
        parking_lot: row.try_get("parking_lot").ok(),
        garages: row.try_get("garages").ok(),
        garden: row.try_get("garden").ok(),
        covered_meters: row.try_get("covered_meters").ok(),
        discovered_meters: row.try_get("discovered_meters").ok(),
        location: row.try_get("location")?,
        location_in: row.try_get("location_in").ok(),
        price_usd: row.try_get("price_usd")?,
        date_joined: row.try_get("date_joined")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_home, insert_local};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{AvailabilityType, LocalType};

    async fn setup() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_get_home_by_id() {
        let pool = setup().await;
        let id = insert_home(&pool, "Casa centrica", AvailabilityType::Buy, 3, 250.0).await;

        let repo = SqlxPropertyRepository::new(pool);
        let property = repo
            .get(PropertyType::Home, id)
            .await
            .expect("query failed")
            .expect("property missing");

        assert_eq!(property.id, id);
        assert_eq!(property.type_property, PropertyType::Home);
        assert_eq!(property.rooms, Some(3));
        assert_eq!(property.type_local, None);
        assert_eq!(property.parking_lot, None);
    }

    #[tokio::test]
    async fn test_get_local_reads_variant_columns() {
        let pool = setup().await;
        let id = insert_local(&pool, "Galpon", LocalType::Industrial, true, 900.0).await;

        let repo = SqlxPropertyRepository::new(pool);
        let property = repo
            .get(PropertyType::Local, id)
            .await
            .expect("query failed")
            .expect("property missing");

        assert_eq!(property.type_local, Some(LocalType::Industrial));
        assert_eq!(property.parking_lot, Some(true));
        assert_eq!(property.rooms, None);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_none() {
        let pool = setup().await;
        let repo = SqlxPropertyRepository::new(pool);
        let result = repo
            .get(PropertyType::Department, Uuid::new_v4())
            .await
            .expect("query failed");
        assert!(result.is_none());
    }
}
