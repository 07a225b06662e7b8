use std::fmt;

use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use serde::Serialize;

/// The logical storage backend a catalog integration binds to.
///
/// If adding a new variant, also add its token to [CATALOG_TYPES].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogType {
    /// The warehouse's own storage, no external catalog
    InfoSchema,
    /// Warehouse-managed Iceberg tables addressed relative to the volume
    BuiltIn,
    /// Warehouse-managed Iceberg tables at an explicit volume-prefixed location
    BiglakeMetastore,
    /// Iceberg tables registered in AWS Glue through an external schema
    Glue,
    /// Iceberg REST catalog, consumed but not written
    IcebergRest,
    /// AWS Glue catalog, consumed but not written
    AwsGlue,
}

const CATALOG_TYPES: [(&str, CatalogType); 6] = [
    ("info_schema", CatalogType::InfoSchema),
    ("built_in", CatalogType::BuiltIn),
    ("biglake_metastore", CatalogType::BiglakeMetastore),
    ("glue", CatalogType::Glue),
    ("iceberg_rest", CatalogType::IcebergRest),
    ("aws_glue", CatalogType::AwsGlue),
];

/// The four resolution behaviours a catalog type can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Internal,
    ManagedExternal,
    ExternalWritable,
    ExternalReadOnly,
}

impl CatalogType {
    pub fn as_str(&self) -> &'static str {
        CATALOG_TYPES
            .iter()
            .find_map(|(token, v)| (v == self).then_some(*token))
            .unwrap_or_default()
    }

    pub fn all() -> impl Iterator<Item = CatalogType> {
        CATALOG_TYPES.iter().map(|(_, v)| *v)
    }

    /// Case-insensitive parse; unknown tokens list every known type.
    pub fn parse_strict(raw: &str) -> AdapterResult<Self> {
        let raw = raw.trim();
        CATALOG_TYPES
            .iter()
            .find_map(|(token, v)| raw.eq_ignore_ascii_case(token).then_some(*v))
            .ok_or_else(|| {
                AdapterError::new(
                    AdapterErrorKind::NotSupported,
                    format!(
                        "catalog_type '{raw}' is not supported. Supported types: ({})",
                        display_list(CatalogType::all())
                    ),
                )
            })
    }

    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogType::InfoSchema => CatalogKind::Internal,
            CatalogType::BuiltIn | CatalogType::BiglakeMetastore => CatalogKind::ManagedExternal,
            CatalogType::Glue => CatalogKind::ExternalWritable,
            CatalogType::IcebergRest | CatalogType::AwsGlue => CatalogKind::ExternalReadOnly,
        }
    }

    pub fn default_table_format(&self) -> TableFormat {
        match self.kind() {
            CatalogKind::Internal => TableFormat::Default,
            _ => TableFormat::Iceberg,
        }
    }

    pub fn default_file_format(&self) -> FileFormat {
        match self.kind() {
            CatalogKind::Internal => FileFormat::Default,
            _ => FileFormat::Parquet,
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a set of types as `a|b|c` for error messages.
pub fn display_list<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Default,
    Iceberg,
}

impl TableFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Default => "default",
            TableFormat::Iceberg => "iceberg",
        }
    }

    pub fn parse(raw: &str) -> AdapterResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("default") {
            Ok(TableFormat::Default)
        } else if raw.eq_ignore_ascii_case("iceberg") {
            Ok(TableFormat::Iceberg)
        } else {
            Err(AdapterError::new(
                AdapterErrorKind::InvalidIntegrationConfig,
                format!("Unsupported table_format '{raw}'. Must be one of (default|iceberg) case insensitive."),
            ))
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Default,
    Parquet,
    Delta,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Default => "default",
            FileFormat::Parquet => "parquet",
            FileFormat::Delta => "delta",
        }
    }

    pub fn parse(raw: &str) -> AdapterResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("default") {
            Ok(FileFormat::Default)
        } else if raw.eq_ignore_ascii_case("parquet") {
            Ok(FileFormat::Parquet)
        } else if raw.eq_ignore_ascii_case("delta") {
            Ok(FileFormat::Delta)
        } else {
            Err(AdapterError::new(
                AdapterErrorKind::InvalidIntegrationConfig,
                format!("Unsupported file_format '{raw}'. Must be one of (default|parquet|delta) case insensitive."),
            ))
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
