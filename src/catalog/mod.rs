//! Catalog client for the upstream track-search provider.

pub mod client;
pub mod models;

pub use client::{CatalogClient, CatalogError};
pub use models::Track;
