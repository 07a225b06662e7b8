//! Typed adapter properties, parsed once when an integration is built.
//!
//! The same coercions run again for model-level overrides; the error kind
//! tells the caller which phase rejected the value.

use dbt_catalogs::CatalogIntegrationConfig;
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use crate::model_config::FlagValue;

pub const MAX_RETENTION_DAYS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationPolicy {
    Compatible,
    Optimized,
}

impl SerializationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationPolicy::Compatible => "COMPATIBLE",
            SerializationPolicy::Optimized => "OPTIMIZED",
        }
    }

    pub fn parse(raw: &str, kind: AdapterErrorKind) -> AdapterResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("compatible") {
            Ok(SerializationPolicy::Compatible)
        } else if raw.eq_ignore_ascii_case("optimized") {
            Ok(SerializationPolicy::Optimized)
        } else {
            Err(AdapterError::new(
                kind,
                format!(
                    "Invalid storage_serialization_policy '{raw}'. Must be one of (COMPATIBLE|OPTIMIZED) case insensitive."
                ),
            ))
        }
    }
}

/// Coerce a change-tracking flag to the `TRUE`/`FALSE` token DDL expects.
///
/// Only booleans and the strings `true`/`false` (any case) are accepted.
pub fn coerce_change_tracking(value: &FlagValue, kind: AdapterErrorKind) -> AdapterResult<&'static str> {
    let as_token = |b: bool| if b { "TRUE" } else { "FALSE" };
    match value {
        FlagValue::Bool(b) => Ok(as_token(*b)),
        FlagValue::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(as_token(true)),
        FlagValue::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(as_token(false)),
        FlagValue::Text(s) => Err(AdapterError::new(
            kind,
            format!("Invalid change_tracking value '{s}'. Must be a boolean or 'true'/'false'."),
        )),
    }
}

pub fn parse_retention_days(key: &str, raw: i64, kind: AdapterErrorKind) -> AdapterResult<u32> {
    u32::try_from(raw)
        .ok()
        .filter(|n| *n <= MAX_RETENTION_DAYS)
        .ok_or_else(|| {
            AdapterError::new(
                kind,
                format!("'{key}' must be an integer in 0..={MAX_RETENTION_DAYS}, got {raw}"),
            )
        })
}

fn invalid(config: &CatalogIntegrationConfig, msg: String) -> AdapterError {
    AdapterError::new(
        AdapterErrorKind::InvalidIntegrationConfig,
        format!("Catalog integration '{}': {msg}", config.name),
    )
}

fn with_integration(config: &CatalogIntegrationConfig, err: AdapterError) -> AdapterError {
    invalid(config, err.message().to_string())
}

fn retention_property(config: &CatalogIntegrationConfig, key: &str) -> AdapterResult<Option<u32>> {
    let Some(raw) = config.property(key) else {
        return Ok(None);
    };
    let n = raw.trim().parse::<i64>().map_err(|_| {
        invalid(
            config,
            format!("'{key}' must be an integer in 0..={MAX_RETENTION_DAYS}, got '{raw}'"),
        )
    })?;
    parse_retention_days(key, n, AdapterErrorKind::InvalidIntegrationConfig)
        .map(Some)
        .map_err(|e| with_integration(config, e))
}

/// Options for warehouse-managed Iceberg tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedProps {
    pub base_location_root: Option<String>,
    pub base_location_subpath: Option<String>,
    pub change_tracking: Option<&'static str>,
    pub storage_serialization_policy: Option<SerializationPolicy>,
    pub data_retention_time_in_days: Option<u32>,
    pub max_data_extension_time_in_days: Option<u32>,
}

impl ManagedProps {
    pub fn from_config(config: &CatalogIntegrationConfig) -> AdapterResult<Self> {
        let kind = AdapterErrorKind::InvalidIntegrationConfig;
        let change_tracking = config
            .adapter_properties
            .get("change_tracking")
            .map(|raw| coerce_change_tracking(&FlagValue::Text(raw.clone()), kind))
            .transpose()
            .map_err(|e| with_integration(config, e))?;
        let storage_serialization_policy = config
            .property("storage_serialization_policy")
            .map(|raw| SerializationPolicy::parse(raw, kind))
            .transpose()
            .map_err(|e| with_integration(config, e))?;

        Ok(Self {
            base_location_root: config.property("base_location_root").map(str::to_string),
            base_location_subpath: config.property("base_location_subpath").map(str::to_string),
            change_tracking,
            storage_serialization_policy,
            data_retention_time_in_days: retention_property(config, "data_retention_time_in_days")?,
            max_data_extension_time_in_days: retention_property(
                config,
                "max_data_extension_time_in_days",
            )?,
        })
    }
}

/// Options for Iceberg tables written through an external catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritableProps {
    pub external_schema: String,
    pub glue_database: Option<String>,
}

impl WritableProps {
    pub fn from_config(config: &CatalogIntegrationConfig) -> AdapterResult<Self> {
        let external_schema = config.property("external_schema").ok_or_else(|| {
            invalid(
                config,
                "missing required adapter property 'external_schema'. It names the schema \
                 bound to the external catalog that tables are registered in."
                    .to_string(),
            )
        })?;
        Ok(Self {
            external_schema: external_schema.trim().to_string(),
            glue_database: config.property("glue_database").map(str::to_string),
        })
    }
}

/// Options for catalogs that are read but never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOnlyProps {
    pub namespace: Option<String>,
}

impl ReadOnlyProps {
    pub fn from_config(config: &CatalogIntegrationConfig) -> Self {
        let namespace = config
            .property("namespace")
            .or_else(|| config.property("catalog_namespace"))
            .map(str::to_string);
        Self { namespace }
    }
}
