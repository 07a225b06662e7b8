use std::path::Path;

use dbt_catalog_adapter::{
    AdapterErrorKind, AdapterType, CatalogIntegration, CatalogIntegrationRegistry, CatalogType,
    ModelConfig,
};
use dbt_catalogs::load_catalogs;
use minijinja::{Environment, Value, context};
use serde_json::json;

const CATALOGS_YML: &str = r#"
catalogs:
  - name: managed_lake
    active_write_integration: built_in_v2
    write_integrations:
      - name: built_in_v1
        catalog_type: built_in
        external_volume: old_volume
      - name: built_in_v2
        catalog_type: BUILT_IN
        table_format: iceberg
        external_volume: lake_volume
        adapter_properties:
          base_location_root: warehouse
          change_tracking: true
          storage_serialization_policy: optimized
          data_retention_time_in_days: 5
    read_integrations:
      - name: partner_rest
        catalog_type: iceberg_rest
        adapter_properties:
          catalog_namespace: partner
"#;

fn model(v: serde_json::Value) -> ModelConfig {
    ModelConfig::from_value(&Value::from_serialize(v)).unwrap()
}

fn registry() -> CatalogIntegrationRegistry {
    let catalogs = load_catalogs(CATALOGS_YML, Path::new("catalogs.yml")).unwrap();
    CatalogIntegrationRegistry::from_catalogs(AdapterType::Snowflake, &catalogs).unwrap()
}

#[test]
fn registers_active_write_and_read_integrations() {
    let registry = registry();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["managed_lake", "partner_rest"]
    );

    let write = registry.get("managed_lake").unwrap();
    assert!(matches!(*write, CatalogIntegration::ManagedExternal(_)));
    assert_eq!(write.catalog_type(), CatalogType::BuiltIn);
    assert!(write.allows_writes());

    let read = registry.get("partner_rest").unwrap();
    assert!(!read.allows_writes());
}

#[test]
fn resolves_model_through_named_catalog() {
    let registry = registry();
    let relation = registry
        .resolve(&model(json!({
            "database": "analytics",
            "schema": "marts",
            "identifier": "orders",
            "catalog_name": "managed_lake",
            "base_location_subpath": "v1",
        })))
        .unwrap();

    assert_eq!(relation.catalog_name, "managed_lake");
    assert_eq!(relation.external_volume.as_deref(), Some("lake_volume"));
    assert_eq!(
        relation.base_location.as_deref(),
        Some("warehouse/marts/orders/v1")
    );
    assert_eq!(
        relation.storage_uri.as_deref(),
        Some("warehouse/marts/orders/v1")
    );
    assert_eq!(relation.change_tracking, Some("TRUE"));
    assert_eq!(relation.storage_serialization_policy, Some("OPTIMIZED"));
    assert_eq!(relation.data_retention_time_in_days, Some(5));
}

#[test]
fn relation_renders_in_ddl_template() {
    let registry = registry();
    let relation = registry
        .resolve(&model(json!({
            "schema": "marts",
            "identifier": "orders",
            "catalog": "managed_lake",
            "external_volume": "override_volume",
        })))
        .unwrap();

    let env = Environment::new();
    let ddl = env
        .render_str(
            "{% if r.catalog_type == 'BUILT_IN' %}external_volume = '{{ r.external_volume }}' base_location = '{{ r.base_location }}' change_tracking = {{ r.change_tracking }}{% endif %}",
            context! { r => Value::from_object(relation) },
        )
        .unwrap();
    assert_eq!(
        ddl,
        "external_volume = 'override_volume' base_location = 'warehouse/marts/orders' change_tracking = TRUE"
    );
}

#[test]
fn model_without_catalog_uses_native_storage() {
    let relation = registry()
        .resolve(&model(json!({ "schema": "s", "identifier": "m" })))
        .unwrap();
    assert_eq!(relation.catalog_type, CatalogType::InfoSchema);
    assert_eq!(relation.storage_uri, None);
}

#[test]
fn bad_model_value_only_fails_that_model() {
    let registry = registry();
    let err = registry
        .resolve(&model(json!({
            "schema": "s",
            "identifier": "bad",
            "catalog_name": "managed_lake",
            "change_tracking": "none",
        })))
        .unwrap_err();
    assert_eq!(err.kind(), AdapterErrorKind::Resolution);

    assert!(
        registry
            .resolve(&model(json!({
                "schema": "s",
                "identifier": "good",
                "catalog_name": "managed_lake",
            })))
            .is_ok()
    );
}

#[test]
fn unsupported_backend_fails_registration() {
    let catalogs = load_catalogs(CATALOGS_YML, Path::new("catalogs.yml")).unwrap();
    let err = CatalogIntegrationRegistry::from_catalogs(AdapterType::Bigquery, &catalogs).unwrap_err();
    assert_eq!(err.kind(), AdapterErrorKind::NotSupported);
    assert!(err.message().contains("(info_schema|biglake_metastore)"));
}
