//! Catalog integrations, per-model storage resolution, and concurrent
//! catalog metadata collection.

pub mod catalog_integration;
pub mod catalog_relation;
pub mod metadata;
pub mod model_config;
pub mod predicate_chunker;
pub mod record_batch_utils;
pub mod reference_key;

pub use catalog_integration::registry::CatalogIntegrationRegistry;
pub use catalog_integration::{
    CatalogIntegration, GlueIntegration, InternalIntegration, ManagedIntegration,
    ReadOnlyIntegration,
};
pub use catalog_relation::CatalogRelation;
pub use metadata::aggregator::{AggregationResult, CatalogMetadataAggregator};
pub use metadata::map_reduce::MapReduce;
pub use metadata::{CatalogSchema, MetadataQuery, RelationConfig};
pub use model_config::{FlagValue, ModelConfig};
pub use predicate_chunker::{PartialChunkFailure, PredicateChunk, PredicateChunker};
pub use reference_key::{ReferenceKey, SchemaKey};

pub use dbt_catalogs::{AdapterType, CatalogIntegrationConfig, CatalogType};
pub use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
