use std::collections::BTreeMap;
use std::sync::Arc;

use dbt_catalogs::{AdapterType, CatalogIntegrationConfig, CatalogType, DbtCatalogs};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use tracing::debug;

use super::CatalogIntegration;
use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

/// Name the backend's native storage integration resolves under.
pub const DEFAULT_INTEGRATION_NAME: &str = "info_schema";

/// Named catalog integrations for one backend.
///
/// Built once while loading project configuration, then shared read-only with
/// everything that resolves models.
#[derive(Debug)]
pub struct CatalogIntegrationRegistry {
    adapter_type: AdapterType,
    integrations: BTreeMap<String, Arc<CatalogIntegration>>,
    default_integration: Arc<CatalogIntegration>,
}

impl CatalogIntegrationRegistry {
    pub fn new(adapter_type: AdapterType) -> AdapterResult<Self> {
        let default_integration = CatalogIntegration::new(
            CatalogIntegrationConfig::new(DEFAULT_INTEGRATION_NAME, CatalogType::InfoSchema),
            adapter_type,
        )?;
        Ok(Self {
            adapter_type,
            integrations: BTreeMap::new(),
            default_integration: Arc::new(default_integration),
        })
    }

    /// Register every integration declared in a validated `catalogs.yml`.
    pub fn from_catalogs(adapter_type: AdapterType, catalogs: &DbtCatalogs) -> AdapterResult<Self> {
        let mut registry = Self::new(adapter_type)?;
        for config in catalogs.integration_configs()? {
            registry.add(config)?;
        }
        Ok(registry)
    }

    pub fn adapter_type(&self) -> AdapterType {
        self.adapter_type
    }

    /// Build and store an integration. An existing name is never overwritten.
    pub fn add(&mut self, config: CatalogIntegrationConfig) -> AdapterResult<Arc<CatalogIntegration>> {
        if self.integrations.contains_key(&config.name) {
            return Err(AdapterError::new(
                AdapterErrorKind::AlreadyExists,
                format!(
                    "Catalog integration '{}' is already registered",
                    config.name
                ),
            ));
        }
        let integration = Arc::new(CatalogIntegration::new(config, self.adapter_type)?);
        debug!(
            name = integration.name(),
            catalog_type = %integration.catalog_type(),
            allows_writes = integration.allows_writes(),
            "registered catalog integration"
        );
        self.integrations
            .insert(integration.name().to_string(), integration.clone());
        Ok(integration)
    }

    pub fn get(&self, name: &str) -> AdapterResult<Arc<CatalogIntegration>> {
        self.integrations.get(name).cloned().ok_or_else(|| {
            let registered = if self.integrations.is_empty() {
                "<none>".to_string()
            } else {
                self.names().collect::<Vec<_>>().join(", ")
            };
            AdapterError::new(
                AdapterErrorKind::NotFound,
                format!(
                    "Catalog integration '{name}' not found. Registered: {registered}"
                ),
            )
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.integrations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    pub fn default_integration(&self) -> &Arc<CatalogIntegration> {
        &self.default_integration
    }

    /// Resolve a model through the integration it names, or the backend's
    /// native storage when it names none.
    pub fn resolve(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        match model.catalog_name.as_deref() {
            Some(name) => self.get(name)?.build_relation(model),
            None => self.default_integration.build_relation(model),
        }
    }
}
