//! Services layer - Business logic
//!
//! This module contains the business logic for the listing backend.
//! Services are responsible for:
//! - Normalizing raw query values into filter descriptors
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod filters;
pub mod jwt;
pub mod password;
pub mod property;
pub mod search;
pub mod user;

pub use filters::{classify, normalize, FieldKind, Filter, FilterEntry, FilterError, FilterMap, FilterValue};
pub use jwt::{decode_token, issue_pair, Claims, TokenPair};
pub use password::{hash_password, verify_password};
pub use property::PropertyService;
pub use search::SearchService;
pub use user::{UserService, UserServiceError};
