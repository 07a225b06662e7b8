use dbt_catalogs::{CatalogIntegrationConfig, CatalogKind};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use super::properties::WritableProps;
use super::{base_relation, resolution_error};
use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

/// Iceberg tables written by the warehouse and registered in an external
/// catalog (Glue) through a bound external schema.
#[derive(Debug, Clone)]
pub struct GlueIntegration {
    config: CatalogIntegrationConfig,
    props: WritableProps,
}

impl GlueIntegration {
    pub fn new(config: CatalogIntegrationConfig) -> AdapterResult<Self> {
        if config.catalog_type.kind() != CatalogKind::ExternalWritable {
            return Err(AdapterError::new(
                AdapterErrorKind::Internal,
                format!(
                    "catalog_type '{}' cannot back an externally cataloged integration",
                    config.catalog_type
                ),
            ));
        }
        let props = WritableProps::from_config(&config)?;
        Ok(Self { config, props })
    }

    pub fn config(&self) -> &CatalogIntegrationConfig {
        &self.config
    }

    pub fn external_schema(&self) -> &str {
        &self.props.external_schema
    }

    pub fn build_relation(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        let mut relation = base_relation(&self.config, model)?;

        relation.storage_uri = match (&model.storage_uri, relation.external_volume.as_deref()) {
            (Some(uri), _) => Some(uri.clone()),
            // table locations are directories; the trailing slash is required
            (None, Some(volume)) => {
                let (Some(schema), Some(identifier)) = (&model.schema, &model.identifier) else {
                    return Err(resolution_error(
                        &self.config,
                        model,
                        AdapterError::new(
                            AdapterErrorKind::Resolution,
                            "a storage location under external_volume needs both schema and identifier",
                        ),
                    ));
                };
                Some(format!(
                    "{}/{}/{}/",
                    volume.trim_end_matches('/'),
                    schema,
                    identifier
                ))
            }
            (None, None) => None,
        };

        relation.external_schema = Some(
            model
                .external_schema
                .clone()
                .unwrap_or_else(|| self.props.external_schema.clone()),
        );
        relation.glue_database = self.props.glue_database.clone();
        relation.partition_by = model.partition_by.clone();
        Ok(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbt_catalogs::{CatalogType, FileFormat, TableFormat};
    use minijinja::Value;
    use serde_json::json;

    fn model(v: serde_json::Value) -> ModelConfig {
        ModelConfig::from_value(&Value::from_serialize(v)).unwrap()
    }

    fn glue() -> GlueIntegration {
        GlueIntegration::new(
            CatalogIntegrationConfig::new("lake", CatalogType::Glue)
                .with_external_volume("s3://bucket/warehouse/")
                .with_property("external_schema", "ext_lake")
                .with_property("glue_database", "lake_db"),
        )
        .unwrap()
    }

    #[test]
    fn missing_external_schema_always_fails() {
        let err = GlueIntegration::new(
            CatalogIntegrationConfig::new("lake", CatalogType::Glue)
                .with_external_volume("s3://bucket")
                .with_table_format(TableFormat::Iceberg)
                .with_file_format(FileFormat::Parquet)
                .with_property("glue_database", "lake_db"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::InvalidIntegrationConfig);
        assert!(err.message().contains("external_schema"));
    }

    #[test]
    fn storage_uri_keeps_trailing_slash() {
        let relation = glue()
            .build_relation(&model(json!({ "schema": "s", "identifier": "m" })))
            .unwrap();
        assert_eq!(
            relation.storage_uri.as_deref(),
            Some("s3://bucket/warehouse/s/m/")
        );
        assert_eq!(relation.external_schema.as_deref(), Some("ext_lake"));
        assert_eq!(relation.glue_database.as_deref(), Some("lake_db"));
        assert_eq!(relation.table_format, TableFormat::Iceberg);
    }

    #[test]
    fn explicit_storage_uri_wins() {
        let relation = glue()
            .build_relation(&model(json!({
                "schema": "s",
                "identifier": "m",
                "storage_uri": "s3://elsewhere/m",
                "external_schema": "other_ext",
            })))
            .unwrap();
        assert_eq!(relation.storage_uri.as_deref(), Some("s3://elsewhere/m"));
        assert_eq!(relation.external_schema.as_deref(), Some("other_ext"));
    }

    #[test]
    fn no_volume_no_uri() {
        let integration = GlueIntegration::new(
            CatalogIntegrationConfig::new("lake", CatalogType::Glue)
                .with_property("external_schema", "ext"),
        )
        .unwrap();
        let relation = integration
            .build_relation(&model(json!({ "schema": "s", "identifier": "m" })))
            .unwrap();
        assert_eq!(relation.storage_uri, None);
    }

    #[test]
    fn partition_by_normalised() {
        let relation = glue()
            .build_relation(&model(json!({
                "schema": "s",
                "identifier": "m",
                "partition_by": "day",
            })))
            .unwrap();
        assert_eq!(relation.partition_by, Some(vec!["day".to_string()]));

        let relation = glue()
            .build_relation(&model(json!({
                "schema": "s",
                "identifier": "m",
                "partition_by": ["region", "day"],
            })))
            .unwrap();
        assert_eq!(
            relation.partition_by,
            Some(vec!["region".to_string(), "day".to_string()])
        );
    }
}
