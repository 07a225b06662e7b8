use dbt_catalogs::{CatalogIntegrationConfig, CatalogKind, CatalogType};
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use super::properties::{
    ManagedProps, SerializationPolicy, coerce_change_tracking, parse_retention_days,
};
use super::{base_relation, build_base_location, resolution_error};
use crate::catalog_relation::CatalogRelation;
use crate::model_config::ModelConfig;

/// How a managed integration turns a base location into a storage URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedLocation {
    /// The volume is implicit to the account; the URI is the base location itself
    NamespaceLocal,
    /// The URI is the external volume followed by the base location
    VolumePrefixed,
}

/// Warehouse-managed Iceberg tables on an external volume.
#[derive(Debug, Clone)]
pub struct ManagedIntegration {
    config: CatalogIntegrationConfig,
    location: ManagedLocation,
    props: ManagedProps,
}

impl ManagedIntegration {
    pub fn new(config: CatalogIntegrationConfig) -> AdapterResult<Self> {
        let location = match config.catalog_type {
            CatalogType::BuiltIn => ManagedLocation::NamespaceLocal,
            ct if ct.kind() == CatalogKind::ManagedExternal => ManagedLocation::VolumePrefixed,
            ct => {
                return Err(AdapterError::new(
                    AdapterErrorKind::Internal,
                    format!("catalog_type '{ct}' cannot back a managed integration"),
                ));
            }
        };
        let props = ManagedProps::from_config(&config)?;
        Ok(Self {
            config,
            location,
            props,
        })
    }

    pub fn config(&self) -> &CatalogIntegrationConfig {
        &self.config
    }

    pub fn location(&self) -> ManagedLocation {
        self.location
    }

    pub fn build_relation(&self, model: &ModelConfig) -> AdapterResult<CatalogRelation> {
        let mut relation = base_relation(&self.config, model)?;
        let resolution = |e: AdapterError| resolution_error(&self.config, model, e);

        let base_location = match (model.schema.as_deref(), model.identifier.as_deref()) {
            (Some(schema), Some(identifier)) => Some(build_base_location(
                model
                    .base_location_root
                    .as_deref()
                    .or(self.props.base_location_root.as_deref()),
                model
                    .base_location_subpath
                    .as_deref()
                    .or(self.props.base_location_subpath.as_deref()),
                Some(schema),
                Some(identifier),
            )),
            _ => None,
        };

        relation.storage_uri = match (&model.storage_uri, &base_location) {
            (Some(uri), _) => Some(uri.clone()),
            (None, None) => {
                return Err(resolution(AdapterError::new(
                    AdapterErrorKind::Resolution,
                    "a managed base location needs both schema and identifier",
                )));
            }
            (None, Some(base)) => match self.location {
                ManagedLocation::NamespaceLocal => Some(base.clone()),
                ManagedLocation::VolumePrefixed => relation
                    .external_volume
                    .as_deref()
                    .map(|volume| format!("{}/{}", volume.trim_end_matches('/'), base)),
            },
        };
        relation.base_location = base_location;

        relation.change_tracking = match &model.change_tracking {
            Some(flag) => Some(
                coerce_change_tracking(flag, AdapterErrorKind::Resolution).map_err(resolution)?,
            ),
            None => self.props.change_tracking,
        };
        relation.storage_serialization_policy = match model.storage_serialization_policy.as_deref() {
            Some(raw) => Some(
                SerializationPolicy::parse(raw, AdapterErrorKind::Resolution)
                    .map_err(resolution)?,
            ),
            None => self.props.storage_serialization_policy,
        }
        .map(|policy| policy.as_str());
        relation.data_retention_time_in_days = match model.data_retention_time_in_days {
            Some(n) => Some(
                parse_retention_days("data_retention_time_in_days", n, AdapterErrorKind::Resolution)
                    .map_err(resolution)?,
            ),
            None => self.props.data_retention_time_in_days,
        };
        relation.max_data_extension_time_in_days = match model.max_data_extension_time_in_days {
            Some(n) => Some(
                parse_retention_days(
                    "max_data_extension_time_in_days",
                    n,
                    AdapterErrorKind::Resolution,
                )
                .map_err(resolution)?,
            ),
            None => self.props.max_data_extension_time_in_days,
        };

        Ok(relation)
    }
}
