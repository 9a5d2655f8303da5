//! Data models
//!
//! This module contains all data structures used throughout the Estancia
//! listing backend:
//! - Property variants and their fixed enumerations
//! - User accounts
//! - The issued-JWT ledger

mod property;
mod token;
mod user;

pub use property::{AvailabilityType, LocalType, Property, PropertyType};
pub use token::OutstandingToken;
pub use user::User;
