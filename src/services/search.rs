//! Listing search orchestration
//!
//! Normalizes the caller's raw query values into filter descriptors and
//! hands them to the search repository. Normalization failures are real
//! errors (the caller sent something unparseable); repository failures
//! are absorbed into an empty result set downstream.

use std::sync::Arc;

use tracing::debug;

use crate::db::repositories::SearchRepository;
use crate::models::Property;
use crate::services::filters::{self, FilterError, FilterMap};

pub struct SearchService {
    repo: Arc<dyn SearchRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<dyn SearchRepository>) -> Self {
        Self { repo }
    }

    /// Run a search over the listing tables.
    ///
    /// `filters` maps field names to the raw values from the query
    /// string. Results come back newest-first across every matched
    /// listing kind.
    pub async fn search(&self, filters: FilterMap) -> Result<Vec<Property>, FilterError> {
        let filters = filters::normalize(filters)?;
        debug!(filters = ?filters, "Running listing search");
        Ok(self.repo.search(&filters).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_department, insert_home};
    use crate::db::repositories::SqlxSearchRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::AvailabilityType;
    use crate::services::filters::FilterEntry;
    use std::collections::BTreeMap;

    fn raw(values: &[&str]) -> FilterEntry {
        FilterEntry::Raw(values.iter().map(|v| v.to_string()).collect())
    }

    async fn setup() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_search_normalizes_raw_values() {
        let pool = setup().await;
        insert_home(&pool, "Casa en alquiler", AvailabilityType::Rent, 3, 150.0).await;
        insert_home(&pool, "Casa en venta", AvailabilityType::Buy, 3, 180.0).await;
        insert_department(&pool, "Depto centrico", AvailabilityType::Rent, 2, 120.0).await;

        let service = SearchService::new(SqlxSearchRepository::boxed(pool));
        let mut filters: FilterMap = BTreeMap::new();
        filters.insert("type_property".to_string(), raw(&["Casa"]));
        filters.insert("availability_type".to_string(), raw(&["Alquiler"]));

        let results = service.search(filters).await.expect("Search failed");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].availability_type, AvailabilityType::Rent);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_integer() {
        let pool = setup().await;
        let service = SearchService::new(SqlxSearchRepository::boxed(pool));

        let mut filters: FilterMap = BTreeMap::new();
        filters.insert("rooms".to_string(), raw(&["tres"]));

        assert!(service.search(filters).await.is_err());
    }
}
