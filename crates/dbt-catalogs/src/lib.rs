//! Typed `catalogs.yml` declarations and the enums shared by catalog integrations.

pub mod adapter;
pub mod dbt_catalogs;
pub mod load_catalogs;
pub mod types;

pub use adapter::AdapterType;
pub use dbt_catalogs::{
    CatalogIntegrationConfig, CatalogSpec, DbtCatalogs, IntegrationSpec, validate_catalogs,
};
pub use load_catalogs::load_catalogs;
pub use types::{CatalogKind, CatalogType, FileFormat, TableFormat, display_list};
