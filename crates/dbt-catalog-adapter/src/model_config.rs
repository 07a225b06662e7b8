use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use minijinja::Value;
use minijinja::value::ValueKind;

/// A flag as written by the user: a real boolean or a string still to be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

/// The model-level keys the catalog layer reads.
///
/// Values arrive from the template layer as a [minijinja::Value]; absent keys,
/// `none`, and empty strings are all treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub identifier: Option<String>,

    pub catalog_name: Option<String>,
    pub table_format: Option<String>,
    pub file_format: Option<String>,
    pub external_volume: Option<String>,
    pub storage_uri: Option<String>,
    pub base_location_root: Option<String>,
    pub base_location_subpath: Option<String>,
    pub partition_by: Option<Vec<String>>,
    pub external_schema: Option<String>,

    pub change_tracking: Option<FlagValue>,
    pub storage_serialization_policy: Option<String>,
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
}

impl ModelConfig {
    pub fn from_value(model_config: &Value) -> AdapterResult<Self> {
        let get = |key: &str| get_model_config_value(model_config, key);

        // `catalog` is the legacy spelling of `catalog_name`
        let catalog_name = get("catalog_name").or_else(|| get("catalog"));
        let identifier = get("identifier").or_else(|| get("alias"));

        Ok(Self {
            database: get("database"),
            schema: get("schema"),
            identifier,
            catalog_name,
            table_format: get("table_format"),
            file_format: get("file_format"),
            external_volume: get("external_volume"),
            storage_uri: get("storage_uri"),
            base_location_root: get("base_location_root"),
            base_location_subpath: get("base_location_subpath"),
            partition_by: get_partition_by(model_config),
            external_schema: get("external_schema"),
            change_tracking: get_flag(model_config, "change_tracking"),
            storage_serialization_policy: get("storage_serialization_policy"),
            data_retention_time_in_days: get_i64(model_config, "data_retention_time_in_days")?,
            max_data_extension_time_in_days: get_i64(
                model_config,
                "max_data_extension_time_in_days",
            )?,
        })
    }

    pub fn with_relation(
        mut self,
        database: impl Into<String>,
        schema: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        self.database = Some(database.into());
        self.schema = Some(schema.into());
        self.identifier = Some(identifier.into());
        self
    }
}

fn defined_attr(model_config: &Value, key: &str) -> Option<Value> {
    match model_config.get_attr(key) {
        Ok(v) if !v.is_undefined() && !v.is_none() => Some(v),
        _ => None,
    }
}

// Serialization can turn None into the string "none"; treat it as absent.
fn get_model_config_value(model_config: &Value, key: &str) -> Option<String> {
    let v = defined_attr(model_config, key)?;
    let s = match v.as_str() {
        Some(s) => s.trim().to_string(),
        None => v.to_string(),
    };
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s)
    }
}

// Raw strings are kept, including "" and "none", so coercion can reject them.
fn get_flag(model_config: &Value, key: &str) -> Option<FlagValue> {
    let v = defined_attr(model_config, key)?;
    Some(match v.kind() {
        ValueKind::Bool => FlagValue::Bool(v.is_true()),
        _ => FlagValue::Text(v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())),
    })
}

fn get_i64(model_config: &Value, key: &str) -> AdapterResult<Option<i64>> {
    let Some(v) = defined_attr(model_config, key) else {
        return Ok(None);
    };
    if let Some(n) = v.as_i64() {
        return Ok(Some(n));
    }
    match v.as_str().map(str::trim) {
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("none") => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(|_| {
            AdapterError::new(
                AdapterErrorKind::Resolution,
                format!("Model config '{key}' must be an integer, got '{s}'"),
            )
        }),
        None => Err(AdapterError::new(
            AdapterErrorKind::Resolution,
            format!("Model config '{key}' must be an integer, got '{v}'"),
        )),
    }
}

// A single column name becomes a one-element list; sequences keep their order.
fn get_partition_by(model_config: &Value) -> Option<Vec<String>> {
    let v = defined_attr(model_config, "partition_by")?;
    match v.kind() {
        ValueKind::Seq => {
            let items = v
                .try_iter()
                .ok()?
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect();
            Some(items)
        }
        _ => get_model_config_value(model_config, "partition_by").map(|s| vec![s]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(v: serde_json::Value) -> ModelConfig {
        ModelConfig::from_value(&Value::from_serialize(v)).unwrap()
    }

    #[test]
    fn reads_relation_and_overrides() {
        let m = model(json!({
            "database": "DB",
            "schema": "s",
            "alias": "m",
            "catalog_name": "lake",
            "external_volume": "  vol  ",
            "data_retention_time_in_days": 3,
            "max_data_extension_time_in_days": "14",
        }));
        assert_eq!(m.database.as_deref(), Some("DB"));
        assert_eq!(m.identifier.as_deref(), Some("m"));
        assert_eq!(m.catalog_name.as_deref(), Some("lake"));
        assert_eq!(m.external_volume.as_deref(), Some("vol"));
        assert_eq!(m.data_retention_time_in_days, Some(3));
        assert_eq!(m.max_data_extension_time_in_days, Some(14));
        assert_eq!(m.storage_uri, None);
    }

    #[test]
    fn none_string_is_absent() {
        let m = model(json!({ "catalog_name": "None", "external_volume": "", "storage_uri": null }));
        assert_eq!(m.catalog_name, None);
        assert_eq!(m.external_volume, None);
        assert_eq!(m.storage_uri, None);
    }

    #[test]
    fn legacy_catalog_alias() {
        let m = model(json!({ "catalog": "old_name" }));
        assert_eq!(m.catalog_name.as_deref(), Some("old_name"));

        let m = model(json!({ "catalog": "old_name", "catalog_name": "new_name" }));
        assert_eq!(m.catalog_name.as_deref(), Some("new_name"));
    }

    #[test]
    fn partition_by_string_or_list() {
        let m = model(json!({ "partition_by": "day" }));
        assert_eq!(m.partition_by, Some(vec!["day".to_string()]));

        let m = model(json!({ "partition_by": ["region", "day"] }));
        assert_eq!(
            m.partition_by,
            Some(vec!["region".to_string(), "day".to_string()])
        );

        let m = model(json!({}));
        assert_eq!(m.partition_by, None);
    }

    #[test]
    fn change_tracking_keeps_raw_text() {
        assert_eq!(
            model(json!({ "change_tracking": true })).change_tracking,
            Some(FlagValue::Bool(true))
        );
        assert_eq!(
            model(json!({ "change_tracking": "none" })).change_tracking,
            Some(FlagValue::Text("none".to_string()))
        );
        assert_eq!(
            model(json!({ "change_tracking": "" })).change_tracking,
            Some(FlagValue::Text(String::new()))
        );
        assert_eq!(model(json!({ "change_tracking": null })).change_tracking, None);
    }

    #[test]
    fn non_integer_retention_is_resolution_error() {
        let err = ModelConfig::from_value(&Value::from_serialize(
            json!({ "data_retention_time_in_days": "soon" }),
        ))
        .unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::Resolution);
        assert!(err.message().contains("'soon'"));
    }
}
