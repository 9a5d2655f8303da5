//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Estancia listing
//! backend. It includes:
//! - Listing search and retrieval endpoints
//! - User registration and token endpoints
//! - Shared response and error types

pub mod common;
pub mod error;
pub mod properties;
pub mod responses;
pub mod users;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;

use crate::services::{PropertyService, SearchService, UserService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<SearchService>,
    pub property_service: Arc<PropertyService>,
    pub user_service: Arc<UserService>,
    /// Results per page on the search endpoint
    pub page_size: usize,
}

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/property/search/", get(properties::search_properties))
        .route(
            "/property/{type_property}/{id}/",
            get(properties::get_property),
        )
        .route("/user/", post(users::register))
        .route("/user/auth/", post(users::authenticate))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(build_api_router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Endpoint-test harness around an in-memory database.

    use std::sync::Arc;

    use axum_test::TestServer;

    use super::{build_api_router, AppState};
    use crate::config::AuthConfig;
    use crate::db::repositories::{
        SqlxPropertyRepository, SqlxSearchRepository, SqlxTokenRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::services::{PropertyService, SearchService, UserService};

    /// Build a test server over a fresh in-memory database, returning the
    /// pool as well so tests can seed rows directly.
    pub async fn spawn_test_server() -> (TestServer, DynDatabasePool) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let auth = AuthConfig {
            secret: "secreto-de-prueba".to_string(),
            access_lifetime_minutes: 30,
            refresh_lifetime_days: 1,
        };
        let state = AppState {
            search_service: Arc::new(SearchService::new(SqlxSearchRepository::boxed(pool.clone()))),
            property_service: Arc::new(PropertyService::new(SqlxPropertyRepository::boxed(
                pool.clone(),
            ))),
            user_service: Arc::new(UserService::new(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxTokenRepository::boxed(pool.clone()),
                auth,
            )),
            page_size: 10,
        };
        let router = build_api_router().with_state(state);
        let server = TestServer::new(router).expect("Failed to start test server");
        (server, pool)
    }
}
