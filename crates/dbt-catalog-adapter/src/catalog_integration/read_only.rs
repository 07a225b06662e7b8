use dbt_catalogs::{CatalogIntegrationConfig, CatalogType, TableFormat, display_list};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use super::{base_relation, resolution_error};
use super::properties::ReadOnlyProps;
use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

pub(crate) const READ_ONLY_CATALOG_TYPES: &[CatalogType] =
    &[CatalogType::IcebergRest, CatalogType::AwsGlue];

/// A catalog whose tables are read but never written.
#[derive(Debug, Clone)]
pub struct ReadOnlyIntegration {
    config: CatalogIntegrationConfig,
    props: ReadOnlyProps,
}

impl ReadOnlyIntegration {
    pub fn new(mut config: CatalogIntegrationConfig) -> AdapterResult<Self> {
        if !READ_ONLY_CATALOG_TYPES.contains(&config.catalog_type) {
            return Err(AdapterError::new(
                AdapterErrorKind::InvalidIntegrationConfig,
                format!(
                    "Catalog integration '{}': catalog_type '{}' cannot be read-only. Expected one of ({})",
                    config.name,
                    config.catalog_type,
                    display_list(READ_ONLY_CATALOG_TYPES)
                ),
            ));
        }
        if let Some(table_format) = config.table_format
            && table_format != TableFormat::Iceberg
        {
            return Err(AdapterError::new(
                AdapterErrorKind::InvalidIntegrationConfig,
                format!(
                    "Catalog integration '{}': table_format '{table_format}' is not supported for catalog_type '{}'. Leave it unset or use 'iceberg'",
                    config.name, config.catalog_type
                ),
            ));
        }
        config.allows_writes = false;
        let props = ReadOnlyProps::from_config(&config);
        Ok(Self { config, props })
    }

    pub fn config(&self) -> &CatalogIntegrationConfig {
        &self.config
    }

    pub fn namespace(&self) -> Option<&str> {
        self.props.namespace.as_deref()
    }

    pub fn build_relation(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        let mut relation = base_relation(&self.config, model)?;
        if relation.table_format != TableFormat::Iceberg {
            return Err(resolution_error(
                &self.config,
                model,
                AdapterError::new(
                    AdapterErrorKind::Resolution,
                    format!(
                        "table_format '{}' is not supported for catalog_type '{}'. Leave it unset or use 'iceberg'",
                        relation.table_format, self.config.catalog_type
                    ),
                ),
            ));
        }
        relation.namespace = self.props.namespace.clone();
        relation.allows_writes = false;
        Ok(relation)
    }
}
