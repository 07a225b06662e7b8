//! catalogs.yml schema: typed serde view + structural validation (no IO).
//!
//! Top-level YAML shape (strict keys):
//!   catalogs:
//!     - name|catalog_name: <string, non-empty>
//!       active_write_integration: <string, non-empty>
//!       write_integrations:
//!         - name|integration_name: <string, non-empty>
//!           catalog_type: info_schema | built_in | biglake_metastore | glue | iceberg_rest | aws_glue
//!           table_format: default | iceberg      // optional; case-insensitive
//!           file_format: default | parquet | delta  // optional; case-insensitive
//!           external_volume: <string>            // optional
//!           adapter_properties: <open map of scalars>
//!       read_integrations: [ same shape, never writable ]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use serde::{Deserialize, Serialize};
use serde_yaml as yml;

use crate::types::{CatalogType, FileFormat, TableFormat};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DbtCatalogs {
    pub catalogs: Vec<CatalogSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSpec {
    #[serde(alias = "catalog_name")]
    pub name: String,
    pub active_write_integration: String,
    pub write_integrations: Vec<IntegrationSpec>,
    #[serde(default)]
    pub read_integrations: Vec<IntegrationSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationSpec {
    #[serde(alias = "integration_name")]
    pub name: String,
    pub catalog_type: String,
    #[serde(default)]
    pub table_format: Option<String>,
    #[serde(default)]
    pub file_format: Option<String>,
    #[serde(default)]
    pub external_volume: Option<String>,
    #[serde(default)]
    pub adapter_properties: BTreeMap<String, yml::Value>,
}

/// An immutable integration declaration, the unit the registry builds from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIntegrationConfig {
    /// Registration name, case-sensitive as declared
    pub name: String,
    pub catalog_type: CatalogType,
    pub table_format: Option<TableFormat>,
    pub file_format: Option<FileFormat>,
    pub external_volume: Option<String>,
    /// Backend-specific options, scalars normalised to strings
    pub adapter_properties: BTreeMap<String, String>,
    pub allows_writes: bool,
}

impl CatalogIntegrationConfig {
    pub fn new(name: impl Into<String>, catalog_type: CatalogType) -> Self {
        Self {
            name: name.into(),
            catalog_type,
            table_format: None,
            file_format: None,
            external_volume: None,
            adapter_properties: BTreeMap::new(),
            allows_writes: true,
        }
    }

    pub fn with_table_format(mut self, table_format: TableFormat) -> Self {
        self.table_format = Some(table_format);
        self
    }

    pub fn with_file_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = Some(file_format);
        self
    }

    pub fn with_external_volume(mut self, external_volume: impl Into<String>) -> Self {
        self.external_volume = Some(external_volume.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.adapter_properties.insert(key.into(), value.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.allows_writes = false;
        self
    }

    /// Non-blank adapter property lookup.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.adapter_properties
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !is_blank(v))
    }
}

impl DbtCatalogs {
    /// Project the declarations onto the configs the registry consumes.
    ///
    /// The active write integration of each catalog is registered under the
    /// catalog's name; read integrations keep their own names.
    pub fn integration_configs(&self) -> AdapterResult<Vec<CatalogIntegrationConfig>> {
        let mut configs = Vec::new();
        for catalog in &self.catalogs {
            let active = catalog
                .write_integrations
                .iter()
                .find(|w| w.name == catalog.active_write_integration)
                .ok_or_else(|| {
                    AdapterError::from_config(format!(
                        "In catalog '{}', active_write_integration '{}' not found",
                        catalog.name, catalog.active_write_integration
                    ))
                })?;
            configs.push(active.to_config(&catalog.name, true)?);
            for read in &catalog.read_integrations {
                configs.push(read.to_config(&read.name, false)?);
            }
        }
        Ok(configs)
    }
}

impl IntegrationSpec {
    fn to_config(&self, name: &str, allows_writes: bool) -> AdapterResult<CatalogIntegrationConfig> {
        let ctx = |e: AdapterError| {
            AdapterError::new(
                e.kind(),
                format!("Integration '{}': {}", self.name, e.message()),
            )
        };
        let catalog_type = CatalogType::parse_strict(&self.catalog_type).map_err(ctx)?;
        let table_format = self
            .table_format
            .as_deref()
            .map(TableFormat::parse)
            .transpose()
            .map_err(ctx)?;
        let file_format = self
            .file_format
            .as_deref()
            .map(FileFormat::parse)
            .transpose()
            .map_err(ctx)?;

        let mut adapter_properties = BTreeMap::new();
        for (key, value) in &self.adapter_properties {
            if let Some(s) = yaml_scalar_to_string(value).map_err(|msg| {
                AdapterError::new(
                    AdapterErrorKind::InvalidIntegrationConfig,
                    format!(
                        "Integration '{}': adapter property '{key}' {msg}",
                        self.name
                    ),
                )
            })? {
                adapter_properties.insert(key.clone(), s);
            }
        }

        Ok(CatalogIntegrationConfig {
            name: name.to_string(),
            catalog_type,
            table_format,
            file_format,
            external_volume: self.external_volume.clone().filter(|v| !is_blank(v)),
            adapter_properties,
            allows_writes,
        })
    }
}

/// Normalise a scalar YAML value; `Ok(None)` for null.
fn yaml_scalar_to_string(value: &yml::Value) -> Result<Option<String>, &'static str> {
    match value {
        yml::Value::Null => Ok(None),
        yml::Value::Bool(b) => Ok(Some(b.to_string())),
        yml::Value::Number(n) => Ok(Some(n.to_string())),
        yml::Value::String(s) => Ok(Some(s.clone())),
        yml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
        yml::Value::Sequence(_) | yml::Value::Mapping(_) => Err("must be a scalar value"),
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn config_err(path: &Path, msg: String) -> AdapterError {
    AdapterError::from_config(format!("{msg} (in '{}')", path.display()))
}

// Structural checks only; per-kind property checks happen when integrations are built
pub fn validate_catalogs(spec: &DbtCatalogs, path: &Path) -> AdapterResult<()> {
    // === 1. Unique, non-blank catalog names
    let mut seen_catalogs = HashSet::new();
    for catalog in &spec.catalogs {
        if is_blank(&catalog.name) {
            return Err(config_err(
                path,
                "Catalog field 'name' or 'catalog_name' must be non-empty".to_string(),
            ));
        }
        if !seen_catalogs.insert(catalog.name.as_str()) {
            return Err(config_err(
                path,
                format!("Duplicate catalog name '{}'", catalog.name),
            ));
        }
    }

    for catalog in &spec.catalogs {
        // === 2. Every catalog requires an active write integration
        if is_blank(&catalog.active_write_integration) {
            return Err(config_err(
                path,
                format!(
                    "In catalog '{}', 'active_write_integration' must be non-empty",
                    catalog.name
                ),
            ));
        }

        // === 3. Named, unique integrations across both lists
        let mut seen = HashSet::new();
        for integration in catalog
            .write_integrations
            .iter()
            .chain(catalog.read_integrations.iter())
        {
            if is_blank(&integration.name) {
                return Err(config_err(
                    path,
                    format!(
                        "Catalog '{}' integration has no field 'name' or 'integration_name'",
                        catalog.name
                    ),
                ));
            }
            if !seen.insert(integration.name.as_str()) {
                return Err(config_err(
                    path,
                    format!(
                        "Duplicate integration name '{}' in catalog '{}'",
                        integration.name, catalog.name
                    ),
                ));
            }
        }

        // === 4. The active write integration must be declared
        if catalog
            .write_integrations
            .iter()
            .all(|w| w.name != catalog.active_write_integration)
        {
            let choices = if catalog.write_integrations.is_empty() {
                "<none>".to_string()
            } else {
                catalog
                    .write_integrations
                    .iter()
                    .map(|w| w.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            return Err(config_err(
                path,
                format!(
                    "In catalog '{}', active_write_integration '{}' not found. Available: {}",
                    catalog.name, catalog.active_write_integration, choices
                ),
            ));
        }
    }
    Ok(())
}
