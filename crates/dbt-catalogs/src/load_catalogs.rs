use std::path::Path;

use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use serde_yaml as yml;
use tracing::debug;

use crate::dbt_catalogs::{DbtCatalogs, validate_catalogs};

/// Parse and validate the text of `<project_root>/catalogs.yml`.
///
/// The validated declarations are returned to the caller, who owns them for
/// the lifetime of the run.
pub fn load_catalogs(text: &str, path: &Path) -> AdapterResult<DbtCatalogs> {
    let text_yml: yml::Value = yml::from_str(text).map_err(|e| yaml_error(e, path))?;

    if !text_yml.is_mapping() {
        return Err(AdapterError::from_config(format!(
            "Top-level of '{}' must be a YAML mapping",
            path.display()
        )));
    }

    let catalogs: DbtCatalogs = yml::from_value(text_yml).map_err(|e| yaml_error(e, path))?;
    validate_catalogs(&catalogs, path)?;
    debug!(
        path = %path.display(),
        catalogs = catalogs.catalogs.len(),
        "loaded catalogs.yml"
    );
    Ok(catalogs)
}

fn yaml_error(err: yml::Error, path: &Path) -> AdapterError {
    AdapterError::new(
        AdapterErrorKind::SerdeYAML,
        format!("Failed to parse '{}': {err}", path.display()),
    )
    .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_yaml() -> &'static str {
        r#"
catalogs:
  - name: c1
    active_write_integration: i1
    write_integrations:
      - name: i1
        catalog_type: built_in
        table_format: iceberg
        external_volume: ev
"#
    }

    #[test]
    fn load_validates_and_returns_catalogs() {
        let path = Path::new("<test>/catalogs.yml");
        let catalogs = load_catalogs(good_yaml(), path).expect("should parse and validate");
        assert_eq!(catalogs.catalogs.len(), 1);
        assert_eq!(catalogs.catalogs[0].write_integrations[0].name, "i1");
    }

    #[test]
    fn top_level_must_be_mapping() {
        let path = Path::new("<test>/catalogs.yml");
        let err = load_catalogs("- just\n- a list\n", path).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::Configuration);
        assert_eq!(
            err.message(),
            "Top-level of '<test>/catalogs.yml' must be a YAML mapping"
        );
    }

    #[test]
    fn missing_catalogs_key_is_yaml_error() {
        let path = Path::new("<test>/catalogs.yml");
        let err = load_catalogs("other: 1\n", path).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::SerdeYAML);
        assert!(err.message().contains("<test>/catalogs.yml"));
    }

    #[test]
    fn malformed_yaml_is_yaml_error() {
        let path = Path::new("<test>/catalogs.yml");
        let err = load_catalogs("catalogs: [", path).unwrap_err();
        assert_eq!(err.kind(), AdapterErrorKind::SerdeYAML);
    }
}
