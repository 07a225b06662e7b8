use std::fmt;

use arrow::array::RecordBatch;
use dbt_error::AdapterResult;

use crate::reference_key::{ReferenceKey, SchemaKey};

pub mod aggregator;
pub mod map_reduce;

/// Upper bound on concurrent connections opened for metadata collection.
pub const MAX_CONNECTIONS: usize = 128;

/// A schema task projecting more distinct relations than this fans out into
/// one task per relation.
pub const MAX_RELATIONS_PER_SCHEMA_QUERY: usize = 100;

// Columns every catalog fragment carries; rows are keyed by them.
pub const TABLE_DATABASE_COLUMN: &str = "table_database";
pub const TABLE_SCHEMA_COLUMN: &str = "table_schema";
pub const TABLE_NAME_COLUMN: &str = "table_name";

/// A relation as declared by the project, in its declared casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationConfig {
    pub database: String,
    pub schema: String,
    pub identifier: String,
}

impl RelationConfig {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            identifier: identifier.into(),
        }
    }

    pub fn reference_key(&self) -> ReferenceKey {
        ReferenceKey::new(&self.database, &self.schema, &self.identifier)
    }

    pub fn schema_key(&self) -> SchemaKey {
        SchemaKey::new(&self.database, &self.schema)
    }
}

impl fmt::Display for RelationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.identifier)
    }
}

/// A (database, schema) pair in use by the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogSchema {
    pub database: String,
    pub schema: String,
}

impl CatalogSchema {
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
        }
    }

    pub fn key(&self) -> SchemaKey {
        SchemaKey::new(&self.database, &self.schema)
    }
}

impl fmt::Display for CatalogSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.schema)
    }
}

/// The driver-backed metadata primitives a backend provides.
///
/// Each worker opens its own connection and never shares it. Both queries
/// return a batch with at least [TABLE_DATABASE_COLUMN], [TABLE_SCHEMA_COLUMN]
/// and [TABLE_NAME_COLUMN] string columns.
pub trait MetadataQuery: Send + Sync + 'static {
    type Connection: 'static;

    fn new_connection(&self) -> AdapterResult<Self::Connection>;

    /// Catalog rows for every relation visible in `schema`.
    fn schema_catalog(
        &self,
        conn: &mut Self::Connection,
        schema: &CatalogSchema,
        relations: &[RelationConfig],
    ) -> AdapterResult<RecordBatch>;

    /// Catalog rows for a single relation.
    fn relation_catalog(
        &self,
        conn: &mut Self::Connection,
        relation: &RelationConfig,
    ) -> AdapterResult<RecordBatch>;
}
