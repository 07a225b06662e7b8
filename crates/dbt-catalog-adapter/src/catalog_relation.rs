use std::fmt::Formatter;
use std::sync::Arc;

use dbt_catalogs::{CatalogType, FileFormat, TableFormat};
use minijinja::Value;
use minijinja::value::{Enumerator, Object};

/// Physical storage parameters resolved for one model.
///
/// Built fresh by each `build_relation` call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CatalogRelation {
    // identity / routing
    pub catalog_name: String,
    pub catalog_type: CatalogType,

    // type & format
    pub table_format: TableFormat,
    pub file_format: FileFormat,

    // location
    pub external_volume: Option<String>,
    pub storage_uri: Option<String>,
    pub base_location: Option<String>,

    // externally cataloged
    pub partition_by: Option<Vec<String>>,
    pub external_schema: Option<String>,
    pub glue_database: Option<String>,
    pub namespace: Option<String>,

    // managed table options
    pub change_tracking: Option<&'static str>,
    pub storage_serialization_policy: Option<&'static str>,
    pub data_retention_time_in_days: Option<u32>,
    pub max_data_extension_time_in_days: Option<u32>,

    pub allows_writes: bool,
}

const FIELDS: &[&str] = &[
    "catalog_name",
    "catalog_type",
    "table_format",
    "file_format",
    "external_volume",
    "storage_uri",
    "base_location",
    "partition_by",
    "external_schema",
    "glue_database",
    "namespace",
    "change_tracking",
    "storage_serialization_policy",
    "data_retention_time_in_days",
    "max_data_extension_time_in_days",
    "allows_writes",
];

impl CatalogRelation {
    pub fn new(
        catalog_name: impl Into<String>,
        catalog_type: CatalogType,
        table_format: TableFormat,
        file_format: FileFormat,
    ) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            catalog_type,
            table_format,
            file_format,
            external_volume: None,
            storage_uri: None,
            base_location: None,
            partition_by: None,
            external_schema: None,
            glue_database: None,
            namespace: None,
            change_tracking: None,
            storage_serialization_policy: None,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
            allows_writes: true,
        }
    }

    pub fn is_iceberg(&self) -> bool {
        self.table_format == TableFormat::Iceberg
    }

    fn map_opt_str(v: Option<&str>) -> Value {
        match v.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Value::from(t),
            None => Value::from(()),
        }
    }

    fn map_opt_u32(v: Option<u32>) -> Value {
        match v {
            Some(n) => Value::from(n),
            None => Value::from(()),
        }
    }
}

impl Object for CatalogRelation {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        Some(match key.as_str()? {
            "catalog_name" => Value::from(self.catalog_name.as_str()),
            // DDL templates compare against uppercase tokens
            "catalog_type" => Value::from(self.catalog_type.as_str().to_uppercase()),
            "table_format" => Value::from(self.table_format.as_str()),
            "file_format" => Value::from(self.file_format.as_str()),

            "external_volume" => Self::map_opt_str(self.external_volume.as_deref()),
            "storage_uri" => Self::map_opt_str(self.storage_uri.as_deref()),
            "base_location" => Self::map_opt_str(self.base_location.as_deref()),

            "partition_by" => match &self.partition_by {
                Some(cols) => Value::from(cols.clone()),
                None => Value::from(()),
            },
            "external_schema" => Self::map_opt_str(self.external_schema.as_deref()),
            "glue_database" => Self::map_opt_str(self.glue_database.as_deref()),
            "namespace" => Self::map_opt_str(self.namespace.as_deref()),

            "change_tracking" => Self::map_opt_str(self.change_tracking),
            "storage_serialization_policy" => {
                Self::map_opt_str(self.storage_serialization_policy)
            }
            "data_retention_time_in_days" => Self::map_opt_u32(self.data_retention_time_in_days),
            "max_data_extension_time_in_days" => {
                Self::map_opt_u32(self.max_data_extension_time_in_days)
            }

            "allows_writes" => Value::from(self.allows_writes),
            "is_iceberg" => Value::from(self.is_iceberg()),

            _ => Value::from(()),
        })
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(FIELDS)
    }

    fn render(self: &Arc<Self>, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CatalogRelation(catalog={}, type={}, format={}, location={})",
            self.catalog_name,
            self.catalog_type,
            self.table_format,
            self.storage_uri.as_deref().unwrap_or("<none>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::Environment;

    fn relation() -> CatalogRelation {
        let mut r = CatalogRelation::new(
            "lake",
            CatalogType::Glue,
            TableFormat::Iceberg,
            FileFormat::Parquet,
        );
        r.external_volume = Some("s3://bucket".to_string());
        r.storage_uri = Some("s3://bucket/s/m/".to_string());
        r.partition_by = Some(vec!["day".to_string()]);
        r.external_schema = Some("ext".to_string());
        r
    }

    #[test]
    fn exposes_fields_to_templates() {
        let env = Environment::new();
        let rel = Value::from_object(relation());
        let out = env
            .render_str(
                "{{ r.catalog_type }} {{ r.storage_uri }} {{ r.partition_by[0] }} {% if r.glue_database is none %}no_db{% endif %} {% if r.is_iceberg %}iceberg{% endif %}",
                minijinja::context! { r => rel },
            )
            .unwrap();
        assert_eq!(out, "GLUE s3://bucket/s/m/ day no_db iceberg");
    }

    #[test]
    fn absent_values_are_none() {
        let rel = Value::from_object(CatalogRelation::new(
            "info_schema",
            CatalogType::InfoSchema,
            TableFormat::Default,
            FileFormat::Default,
        ));
        assert!(rel.get_attr("storage_uri").unwrap().is_none());
        assert!(rel.get_attr("change_tracking").unwrap().is_none());
        assert!(rel.get_attr("no_such_field").unwrap().is_none());
        assert_eq!(rel.get_attr("table_format").unwrap().as_str(), Some("default"));
    }

    #[test]
    fn serializes_tokens_lowercase() {
        let json = serde_json::to_value(relation()).unwrap();
        assert_eq!(json["catalog_type"], "glue");
        assert_eq!(json["table_format"], "iceberg");
        assert_eq!(json["partition_by"][0], "day");
        assert!(json["namespace"].is_null());
    }

    #[test]
    fn renders_compactly() {
        let rel = Value::from_object(relation());
        assert_eq!(
            rel.to_string(),
            "CatalogRelation(catalog=lake, type=glue, format=iceberg, location=s3://bucket/s/m/)"
        );
    }
}
