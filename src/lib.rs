//! Estancia - A real-estate listing and search backend
//!
//! This library provides the core functionality for the Estancia listing
//! backend.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
