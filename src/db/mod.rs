//! Database layer
//!
//! Persistence for the listing backend:
//! - SQLite (default, single-binary deployment)
//! - MySQL (larger deployments)
//!
//! The driver is selected from configuration. Repositories dispatch on the
//! `DatabasePool` trait and use the typed pool underneath.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
