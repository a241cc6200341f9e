//! Catalog loading for the homestead engine.
//!
//! Installation type definitions are authored as data files (RON, TOML, or
//! JSON), discovered by base name with extension-based format detection,
//! and resolved into an immutable [`homestead_core::catalog::Catalog`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, catalog_from_specs, load_catalog};
pub use schema::{InstallationTypeSpec, ReservoirSpec};
