//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations for one entity or concern.

pub mod property;
pub mod search;
pub mod token;
pub mod user;

pub use property::{PropertyRepository, SqlxPropertyRepository};
pub use search::{SearchRepository, SqlxSearchRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{SqlxUserRepository, UserRepository};
