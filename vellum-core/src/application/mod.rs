//! Composition of the catalog managers for upstream callers.

pub mod catalog;

pub use catalog::{CatalogServices, CatalogServicesBuilder};
