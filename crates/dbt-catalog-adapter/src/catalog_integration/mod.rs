//! Catalog integrations: one resolution strategy per kind of storage backend.
//!
//! Every variant applies the same per-field precedence when building a
//! relation: model override, then integration property, then variant default.

use dbt_catalogs::{
    AdapterType, CatalogIntegrationConfig, CatalogKind, CatalogType, FileFormat, TableFormat,
    display_list,
};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

mod glue;
mod internal;
mod managed;
pub mod properties;
mod read_only;
pub mod registry;

pub use glue::GlueIntegration;
pub use internal::InternalIntegration;
pub use managed::{ManagedIntegration, ManagedLocation};
pub use read_only::ReadOnlyIntegration;

#[derive(Debug, Clone)]
pub enum CatalogIntegration {
    /// The warehouse's own storage
    Internal(InternalIntegration),
    /// Volume plus derived location, managed by the warehouse
    ManagedExternal(ManagedIntegration),
    /// Registered in an external catalog through a bound schema
    ExternalWritable(GlueIntegration),
    /// Consumed from an external catalog, never written
    ExternalReadOnly(ReadOnlyIntegration),
}

impl CatalogIntegration {
    /// Build the integration for `config` on a backend of type `adapter_type`.
    ///
    /// Fails with `NotSupported` when the backend does not accept the catalog
    /// type, and with `InvalidIntegrationConfig` when a required property is
    /// missing or malformed.
    pub fn new(config: CatalogIntegrationConfig, adapter_type: AdapterType) -> AdapterResult<Self> {
        if !adapter_type.supports(config.catalog_type) {
            return Err(AdapterError::new(
                AdapterErrorKind::NotSupported,
                format!(
                    "Catalog integration '{}': catalog_type '{}' is not supported by the {} adapter. Supported types: ({})",
                    config.name,
                    config.catalog_type,
                    adapter_type,
                    display_list(adapter_type.supported_catalog_types())
                ),
            ));
        }

        let kind = config.catalog_type.kind();
        if !config.allows_writes && kind != CatalogKind::ExternalReadOnly {
            return Err(AdapterError::new(
                AdapterErrorKind::InvalidIntegrationConfig,
                format!(
                    "Catalog integration '{}': read integrations must use a read-only catalog_type ({}), got '{}'",
                    config.name,
                    display_list(read_only::READ_ONLY_CATALOG_TYPES),
                    config.catalog_type
                ),
            ));
        }

        Ok(match kind {
            CatalogKind::Internal => Self::Internal(InternalIntegration::new(config)?),
            CatalogKind::ManagedExternal => Self::ManagedExternal(ManagedIntegration::new(config)?),
            CatalogKind::ExternalWritable => Self::ExternalWritable(GlueIntegration::new(config)?),
            CatalogKind::ExternalReadOnly => Self::ExternalReadOnly(ReadOnlyIntegration::new(config)?),
        })
    }

    pub fn config(&self) -> &CatalogIntegrationConfig {
        match self {
            Self::Internal(i) => i.config(),
            Self::ManagedExternal(i) => i.config(),
            Self::ExternalWritable(i) => i.config(),
            Self::ExternalReadOnly(i) => i.config(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config().name
    }

    pub fn catalog_type(&self) -> CatalogType {
        self.config().catalog_type
    }

    pub fn allows_writes(&self) -> bool {
        match self {
            Self::ExternalReadOnly(_) => false,
            _ => self.config().allows_writes,
        }
    }

    /// Resolve the physical storage parameters for one model.
    pub fn build_relation(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        match self {
            Self::Internal(i) => i.build_relation(model),
            Self::ManagedExternal(i) => i.build_relation(model),
            Self::ExternalWritable(i) => i.build_relation(model),
            Self::ExternalReadOnly(i) => i.build_relation(model),
        }
    }
}

fn model_label(model: &ModelConfig) -> String {
    match (&model.schema, &model.identifier) {
        (Some(s), Some(i)) => format!("{s}.{i}"),
        (None, Some(i)) => i.clone(),
        _ => "<unnamed>".to_string(),
    }
}

/// Re-raise `err` as a resolution failure for `model`.
pub(crate) fn resolution_error(
    config: &CatalogIntegrationConfig,
    model: &ModelConfig,
    err: AdapterError,
) -> AdapterError {
    AdapterError::new(
        AdapterErrorKind::Resolution,
        format!(
            "Model '{}' in catalog integration '{}': {}",
            model_label(model),
            config.name,
            err.message()
        ),
    )
}

/// The fields every variant resolves the same way.
pub(crate) fn base_relation(
    config: &CatalogIntegrationConfig,
    model: &ModelConfig,
) -> AdapterResult<CatalogRelation> {
    let table_format = match model.table_format.as_deref() {
        Some(raw) => TableFormat::parse(raw).map_err(|e| resolution_error(config, model, e))?,
        None => config
            .table_format
            .unwrap_or_else(|| config.catalog_type.default_table_format()),
    };
    let file_format = match model.file_format.as_deref() {
        Some(raw) => FileFormat::parse(raw).map_err(|e| resolution_error(config, model, e))?,
        None => config
            .file_format
            .unwrap_or_else(|| config.catalog_type.default_file_format()),
    };

    let mut relation = CatalogRelation::new(
        config.name.as_str(),
        config.catalog_type,
        table_format,
        file_format,
    );
    relation.external_volume = model
        .external_volume
        .clone()
        .or_else(|| config.external_volume.clone());
    relation.allows_writes = config.allows_writes;
    Ok(relation)
}

/// `<root|_dbt>/<schema>/<identifier>[/<subpath>]`, skipping blank parts.
pub(crate) fn build_base_location(
    root: Option<&str>,
    subpath: Option<&str>,
    schema: Option<&str>,
    identifier: Option<&str>,
) -> String {
    let prefix = root
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("_dbt");

    let mut parts = vec![prefix];
    for part in [schema, identifier, subpath] {
        if let Some(p) = part.map(str::trim).filter(|p| !p.is_empty()) {
            parts.push(p);
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_location_defaults_and_order() {
        assert_eq!(build_base_location(None, None, None, None), "_dbt");
        assert_eq!(build_base_location(None, None, Some("S"), None), "_dbt/S");
        assert_eq!(build_base_location(None, None, Some("s"), Some("m")), "_dbt/s/m");
        assert_eq!(
            build_base_location(Some("root"), Some("sub"), Some("s"), Some("m")),
            "root/s/m/sub"
        );
        assert_eq!(
            build_base_location(Some("  "), Some(" "), Some(" s "), Some("m")),
            "_dbt/s/m"
        );
    }

    #[test]
    fn unsupported_type_lists_supported_set() {
        let config = CatalogIntegrationConfig::new("lake", CatalogType::Glue);
        let err = CatalogIntegration::new(config, AdapterType::Snowflake).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::NotSupported);
        assert!(err.message().contains("'glue'"));
        assert!(
            err.message()
                .contains("(info_schema|built_in|iceberg_rest|aws_glue)"),
            "{err}"
        );
    }

    #[test]
    fn read_integration_needs_read_only_type() {
        let config = CatalogIntegrationConfig::new("r", CatalogType::BuiltIn)
            .with_external_volume("vol")
            .read_only();
        let err = CatalogIntegration::new(config, AdapterType::Snowflake).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::InvalidIntegrationConfig);
    }

    #[test]
    fn dispatches_on_kind() {
        let internal = CatalogIntegration::new(
            CatalogIntegrationConfig::new("info", CatalogType::InfoSchema),
            AdapterType::Postgres,
        )
        .unwrap();
        assert!(matches!(internal, CatalogIntegration::Internal(_)));
        assert!(internal.allows_writes());

        let read = CatalogIntegration::new(
            CatalogIntegrationConfig::new("rest", CatalogType::IcebergRest),
            AdapterType::Snowflake,
        )
        .unwrap();
        assert!(matches!(read, CatalogIntegration::ExternalReadOnly(_)));
        assert!(!read.allows_writes());
    }

    #[test]
    fn precedence_is_per_field() {
        let integration = CatalogIntegration::new(
            CatalogIntegrationConfig::new("info", CatalogType::InfoSchema)
                .with_external_volume("integration_vol")
                .with_file_format(FileFormat::Parquet),
            AdapterType::Snowflake,
        )
        .unwrap();

        let mut model = ModelConfig::default().with_relation("db", "s", "m");
        model.external_volume = Some("model_vol".to_string());
        let relation = integration.build_relation(&model).unwrap();
        assert_eq!(relation.external_volume.as_deref(), Some("model_vol"));
        assert_eq!(relation.file_format, FileFormat::Parquet);
        assert_eq!(relation.table_format, TableFormat::Default);
    }

    #[test]
    fn bad_model_table_format_is_resolution_error() {
        let integration = CatalogIntegration::new(
            CatalogIntegrationConfig::new("info", CatalogType::InfoSchema),
            AdapterType::Snowflake,
        )
        .unwrap();
        let mut model = ModelConfig::default().with_relation("db", "s", "m");
        model.table_format = Some("hudi".to_string());
        let err = integration.build_relation(&model).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::Resolution);
        assert!(err.message().starts_with("Model 's.m' in catalog integration 'info'"));
    }
}
