//! Single-listing retrieval

use std::sync::Arc;

use anyhow::Result;

use crate::db::repositories::PropertyRepository;
use crate::models::{Property, PropertyType};
use uuid::Uuid;

pub struct PropertyService {
    repo: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(repo: Arc<dyn PropertyRepository>) -> Self {
        Self { repo }
    }

    /// Fetch one listing by kind and id. `Ok(None)` when no such row exists.
    pub async fn get(&self, type_property: PropertyType, id: Uuid) -> Result<Option<Property>> {
        self.repo.get(type_property, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::insert_home;
    use crate::db::repositories::SqlxPropertyRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::AvailabilityType;

    async fn setup() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_get_existing_listing() {
        let pool = setup().await;
        let id = insert_home(&pool, "Casa quinta", AvailabilityType::Buy, 4, 210.0).await;

        let service = PropertyService::new(SqlxPropertyRepository::boxed(pool));
        let property = service
            .get(PropertyType::Home, id)
            .await
            .expect("Query failed")
            .expect("Listing not found");
        assert_eq!(property.id, id);
        assert_eq!(property.rooms, Some(4));
    }

    #[tokio::test]
    async fn test_get_wrong_kind_returns_none() {
        let pool = setup().await;
        let id = insert_home(&pool, "Casa quinta", AvailabilityType::Buy, 4, 210.0).await;

        let service = PropertyService::new(SqlxPropertyRepository::boxed(pool));
        let result = service
            .get(PropertyType::Department, id)
            .await
            .expect("Query failed");
        assert!(result.is_none());
    }
}
