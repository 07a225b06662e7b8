use dbt_catalogs::{CatalogIntegrationConfig, CatalogKind};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use super::base_relation;
use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

/// The warehouse's native storage; no external catalog is involved.
#[derive(Debug, Clone)]
pub struct InternalIntegration {
    config: CatalogIntegrationConfig,
}

impl InternalIntegration {
    pub fn new(config: CatalogIntegrationConfig) -> AdapterResult<Self> {
        if config.catalog_type.kind() != CatalogKind::Internal {
            return Err(AdapterError::new(
                AdapterErrorKind::Internal,
                format!(
                    "catalog_type '{}' cannot back an internal integration",
                    config.catalog_type
                ),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &CatalogIntegrationConfig {
        &self.config
    }

    pub fn build_relation(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        let mut relation = base_relation(&self.config, model)?;
        relation.storage_uri = model.storage_uri.clone();
        Ok(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbt_catalogs::{CatalogType, FileFormat, TableFormat};

    #[test]
    fn defaults_to_native_formats() {
        let integration =
            InternalIntegration::new(CatalogIntegrationConfig::new("info", CatalogType::InfoSchema))
                .unwrap();
        let relation = integration
            .build_relation(&ModelConfig::default().with_relation("db", "s", "m"))
            .unwrap();
        assert_eq!(relation.catalog_name, "info");
        assert_eq!(relation.catalog_type, CatalogType::InfoSchema);
        assert_eq!(relation.table_format, TableFormat::Default);
        assert_eq!(relation.file_format, FileFormat::Default);
        assert_eq!(relation.storage_uri, None);
        assert_eq!(relation.base_location, None);
    }

    #[test]
    fn rejects_external_types() {
        let err =
            InternalIntegration::new(CatalogIntegrationConfig::new("x", CatalogType::Glue)).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::Internal);
    }
}
