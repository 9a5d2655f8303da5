//! Search repository
//!
//! Translates canonical filter descriptors into SQL predicates and runs one
//! query per targeted property variant. Results are merged and re-sorted by
//! creation timestamp descending across variants.
//!
//! Read-path datastore failures are soft: a failing query is logged and
//! contributes no rows, so an unreachable database looks like "no results"
//! to the caller rather than an error.

use crate::config::DatabaseDriver;
use crate::db::repositories::property::{row_to_property_mysql, row_to_property_sqlite};
use crate::db::DynDatabasePool;
use crate::models::{Property, PropertyType};
use crate::services::filters::{Filter, FilterEntry, FilterMap, FilterValue};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

/// Search repository trait
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Run a search over the variants named by the `type_property` filter.
    ///
    /// Expects an already-normalized filter mapping; raw entries and fields a
    /// variant's table doesn't carry are skipped.
    async fn search(&self, filters: &FilterMap) -> Vec<Property>;
}

/// SQLx-based search repository supporting SQLite and MySQL.
pub struct SqlxSearchRepository {
    pool: DynDatabasePool,
}

impl SqlxSearchRepository {
    /// Create a new SQLx search repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SearchRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SearchRepository for SqlxSearchRepository {
    async fn search(&self, filters: &FilterMap) -> Vec<Property> {
        let get_all = return_all_requested(filters);
        let mut properties = Vec::new();

        for variant in targeted_variants(filters) {
            let (sql, binds) = build_variant_query(variant, filters, get_all);

            let result = match self.pool.driver() {
                DatabaseDriver::Sqlite => {
                    run_query_sqlite(self.pool.as_sqlite().unwrap(), &sql, &binds).await
                }
                DatabaseDriver::Mysql => {
                    run_query_mysql(self.pool.as_mysql().unwrap(), &sql, &binds).await
                }
            };

            match result {
                Ok(rows) => properties.extend(rows),
                Err(e) => {
                    tracing::warn!(
                        "Search query against '{}' failed, treating as empty: {}",
                        variant.table(),
                        e
                    );
                }
            }
        }

        // Newest first across all variants.
        properties.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
        properties
    }
}

/// Whether the explicit return-all flag is set.
fn return_all_requested(filters: &FilterMap) -> bool {
    matches!(
        filters.get("all"),
        Some(FilterEntry::Descriptor(Filter::Exact {
            value: FilterValue::Bool(true)
        }))
    )
}

/// Variants named by the `type_property` filter. Falls back to all three
/// when the filter is missing or carries an unknown label.
fn targeted_variants(filters: &FilterMap) -> Vec<PropertyType> {
    let labels: Vec<&str> = match filters.get("type_property") {
        Some(FilterEntry::Descriptor(Filter::Exact {
            value: FilterValue::Str(label),
        })) => vec![label.as_str()],
        Some(FilterEntry::Descriptor(Filter::Multiple { value })) => value
            .iter()
            .filter_map(|v| match v {
                FilterValue::Str(label) => Some(label.as_str()),
                _ => None,
            })
            .collect(),
        _ => return PropertyType::ALL.to_vec(),
    };

    let variants: Vec<PropertyType> = labels
        .iter()
        .filter_map(|label| PropertyType::from_str(label).ok())
        .collect();

    if variants.is_empty() {
        PropertyType::ALL.to_vec()
    } else {
        variants
    }
}

/// Build the SQL text and bind list for one variant's query.
///
/// Only fields present in the variant's filterable column set become
/// predicates; `all` and `type_property` steer the query but are never
/// predicates themselves. Column names come from the static tables, so
/// the formatted SQL carries no user-controlled identifiers.
fn build_variant_query(
    variant: PropertyType,
    filters: &FilterMap,
    get_all: bool,
) -> (String, Vec<FilterValue>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut binds: Vec<FilterValue> = Vec::new();

    if !get_all {
        for (field, entry) in filters {
            let FilterEntry::Descriptor(filter) = entry else {
                continue;
            };
            if field == "all" || field == "type_property" {
                continue;
            }
            if !variant.filterable_columns().contains(&field.as_str()) {
                continue;
            }

            match filter {
                Filter::Exact { value } => {
                    clauses.push(format!("{} = ?", field));
                    binds.push(value.clone());
                }
                Filter::Multiple { value } => {
                    let placeholders = vec!["?"; value.len()].join(", ");
                    clauses.push(format!("{} IN ({})", field, placeholders));
                    binds.extend(value.iter().cloned());
                }
                Filter::Gte { value } => {
                    clauses.push(format!("{} >= ?", field));
                    binds.push(value.clone());
                }
                Filter::Lte { value } => {
                    clauses.push(format!("{} <= ?", field));
                    binds.push(value.clone());
                }
                Filter::Range {
                    min_value,
                    max_value,
                } => {
                    clauses.push(format!("{} BETWEEN ? AND ?", field));
                    binds.push(FilterValue::Num(*min_value));
                    binds.push(FilterValue::Num(*max_value));
                }
            }
        }
    }

    let mut sql = format!("SELECT * FROM {}", variant.table());
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY date_joined DESC");

    (sql, binds)
}

async fn run_query_sqlite(
    pool: &sqlx::SqlitePool,
    sql: &str,
    binds: &[FilterValue],
) -> anyhow::Result<Vec<Property>> {
    let mut query = sqlx::query(sql);
    for bind in binds {
        query = match bind {
            FilterValue::Str(s) => query.bind(s.clone()),
            FilterValue::Int(i) => query.bind(*i),
            FilterValue::Bool(b) => query.bind(*b),
            FilterValue::Num(f) => query.bind(*f),
        };
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_property_sqlite).collect()
}

async fn run_query_mysql(
    pool: &sqlx::MySqlPool,
    sql: &str,
    binds: &[FilterValue],
) -> anyhow::Result<Vec<Property>> {
    let mut query = sqlx::query(sql);
    for bind in binds {
        query = match bind {
            FilterValue::Str(s) => query.bind(s.clone()),
            FilterValue::Int(i) => query.bind(*i),
            FilterValue::Bool(b) => query.bind(*b),
            FilterValue::Num(f) => query.bind(*f),
        };
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_property_mysql).collect()
}
