use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::types::CatalogType;

/// The type of the adapter.
///
/// Used to identify the backend an integration is registered against and the
/// catalog types that backend accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    /// Postgres
    Postgres,
    /// Snowflake
    Snowflake,
    /// Bigquery
    Bigquery,
    /// Redshift
    Redshift,
    /// Athena
    Athena,
}

impl AdapterType {
    /// Catalog types this backend can materialize into or read from.
    pub fn supported_catalog_types(&self) -> &'static [CatalogType] {
        match self {
            AdapterType::Postgres => &[CatalogType::InfoSchema],
            AdapterType::Snowflake => &[
                CatalogType::InfoSchema,
                CatalogType::BuiltIn,
                CatalogType::IcebergRest,
                CatalogType::AwsGlue,
            ],
            AdapterType::Bigquery => &[CatalogType::InfoSchema, CatalogType::BiglakeMetastore],
            AdapterType::Redshift => &[CatalogType::InfoSchema, CatalogType::Glue],
            AdapterType::Athena => &[
                CatalogType::InfoSchema,
                CatalogType::Glue,
                CatalogType::AwsGlue,
            ],
        }
    }

    pub fn supports(&self, catalog_type: CatalogType) -> bool {
        self.supported_catalog_types().contains(&catalog_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            AdapterType::from_str("Snowflake").unwrap(),
            AdapterType::Snowflake
        );
        assert_eq!(AdapterType::from_str("ATHENA").unwrap(), AdapterType::Athena);
        assert!(AdapterType::from_str("oracle").is_err());
        assert_eq!(AdapterType::Bigquery.to_string(), "bigquery");
    }

    #[test]
    fn every_backend_supports_internal_storage() {
        for adapter in [
            AdapterType::Postgres,
            AdapterType::Snowflake,
            AdapterType::Bigquery,
            AdapterType::Redshift,
            AdapterType::Athena,
        ] {
            assert!(adapter.supports(CatalogType::InfoSchema), "{adapter}");
        }
        assert!(!AdapterType::Postgres.supports(CatalogType::Glue));
        assert!(AdapterType::Redshift.supports(CatalogType::Glue));
    }
}
