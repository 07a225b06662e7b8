use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, RecordBatch, new_null_array};
use arrow::compute::{cast, concat_batches, filter_record_batch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use dbt_error::{AdapterError, AdapterResult, AsyncAdapterResult};
use tracing::{debug, warn};

use super::map_reduce::{MapFn, MapReduce, NewConnectionFn, ReduceFn};
use super::{CatalogSchema, MAX_RELATIONS_PER_SCHEMA_QUERY, MetadataQuery, RelationConfig};
use crate::record_batch_utils;
use crate::reference_key::{ReferenceKey, SchemaKey};

/// One unit of metadata collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogTask {
    /// One bulk query for a whole schema
    Schema {
        schema: CatalogSchema,
        relations: Vec<RelationConfig>,
    },
    /// One lookup for a relation of an oversized schema
    Relation(RelationConfig),
}

impl fmt::Display for CatalogTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogTask::Schema { schema, .. } => write!(f, "schema {schema}"),
            CatalogTask::Relation(relation) => write!(f, "relation {relation}"),
        }
    }
}

/// Merged catalog rows plus the failures of the tasks that contributed none.
///
/// Errors never invalidate the rows: every succeeding task's fragment is kept
/// as returned, and fragments with differing columns are reconciled only when
/// merged.
#[derive(Debug, Default)]
pub struct AggregationResult {
    pub batches: Vec<RecordBatch>,
    pub errors: Vec<AdapterError>,
}

impl AggregationResult {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// All rows as one batch, or `None` when no task produced a fragment.
    ///
    /// The merged schema is the union of every fragment's columns; a column
    /// missing from a fragment is null for its rows, and a column whose type
    /// differs between fragments is cast to Utf8.
    pub fn to_record_batch(&self) -> AdapterResult<Option<RecordBatch>> {
        if self.batches.is_empty() {
            return Ok(None);
        }
        let schema = unified_schema(&self.batches);
        let conformed = self
            .batches
            .iter()
            .map(|batch| conform(batch, &schema))
            .collect::<AdapterResult<Vec<_>>>()?;
        Ok(Some(concat_batches(&schema, &conformed)?))
    }

    fn accept(&mut self, batch: RecordBatch) -> AdapterResult<()> {
        // rows must be addressable by reference key
        record_batch_utils::reference_keys(&batch)?;
        self.batches.push(batch);
        Ok(())
    }

    pub fn reference_keys(&self) -> AdapterResult<Vec<ReferenceKey>> {
        let mut keys = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            keys.extend(record_batch_utils::reference_keys(batch)?);
        }
        Ok(keys)
    }

    /// Keep only the rows whose reference key is in `only`.
    pub fn retain_relations(self, only: &HashSet<ReferenceKey>) -> AdapterResult<Self> {
        let mut batches = Vec::with_capacity(self.batches.len());
        for batch in self.batches {
            let mask = record_batch_utils::reference_keys(&batch)?
                .iter()
                .map(|key| Some(only.contains(key)))
                .collect::<BooleanArray>();
            let filtered = filter_record_batch(&batch, &mask)?;
            if filtered.num_rows() > 0 {
                batches.push(filtered);
            }
        }
        Ok(Self {
            batches,
            errors: self.errors,
        })
    }
}

fn unified_schema(batches: &[RecordBatch]) -> SchemaRef {
    let mut fields: Vec<Field> = Vec::new();
    for batch in batches {
        for field in batch.schema().fields() {
            match fields.iter_mut().find(|f| f.name() == field.name()) {
                Some(existing) if existing.data_type() != field.data_type() => {
                    let name = existing.name().clone();
                    *existing = Field::new(name, DataType::Utf8, true);
                }
                Some(_) => {}
                None => fields.push(Field::new(field.name(), field.data_type().clone(), true)),
            }
        }
    }
    Arc::new(Schema::new(fields))
}

fn conform(batch: &RecordBatch, schema: &SchemaRef) -> AdapterResult<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(column) if column.data_type() == field.data_type() => Ok(column.clone()),
            Some(column) => Ok(cast(column, field.data_type())?),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<AdapterResult<Vec<ArrayRef>>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Collects catalog metadata for many schemas over a bounded worker pool.
///
/// Collection is collect-all: a failed task is recorded in the result and
/// never cancels its siblings.
pub struct CatalogMetadataAggregator<Q: MetadataQuery> {
    query: Arc<Q>,
    threads: usize,
}

impl<Q: MetadataQuery> CatalogMetadataAggregator<Q> {
    /// `threads` is the backend's configured concurrency; 0 means the framework cap.
    pub fn new(query: Arc<Q>, threads: usize) -> Self {
        Self { query, threads }
    }

    /// Metadata for every relation visible in `used_schemas`.
    pub fn get_catalog(
        &self,
        relation_configs: &[RelationConfig],
        used_schemas: &[CatalogSchema],
    ) -> AsyncAdapterResult<'_, AggregationResult> {
        let tasks = plan_tasks(relation_configs, used_schemas);
        self.collect(tasks)
    }

    /// Same collection as [Self::get_catalog], restricted afterwards to
    /// `only_relations` by reference key.
    pub fn get_filtered_catalog(
        &self,
        relation_configs: &[RelationConfig],
        used_schemas: &[CatalogSchema],
        only_relations: &[RelationConfig],
    ) -> AsyncAdapterResult<'_, AggregationResult> {
        let only = only_relations
            .iter()
            .map(RelationConfig::reference_key)
            .collect::<HashSet<_>>();
        let collected = self.get_catalog(relation_configs, used_schemas);
        Box::pin(async move { collected.await?.retain_relations(&only) })
    }

    fn collect(&self, tasks: Vec<CatalogTask>) -> AsyncAdapterResult<'_, AggregationResult> {
        let query = self.query.clone();
        let new_connection_f: NewConnectionFn<Q::Connection> =
            Box::new(move || query.new_connection());

        let query = self.query.clone();
        let map_f: MapFn<Q::Connection, CatalogTask, RecordBatch> =
            Box::new(move |conn: &mut Q::Connection, task: &CatalogTask| match task {
                CatalogTask::Schema { schema, relations } => {
                    query.schema_catalog(conn, schema, relations)
                }
                CatalogTask::Relation(relation) => query.relation_catalog(conn, relation),
            });

        let reduce_f: ReduceFn<AggregationResult, CatalogTask, RecordBatch> = Box::new(
            |acc: &mut AggregationResult, task: CatalogTask, batch: AdapterResult<RecordBatch>| {
                if let Err(e) = batch.and_then(|batch| acc.accept(batch)) {
                    warn!(task = %task, error = %e, "catalog task failed");
                    acc.errors
                        .push(AdapterError::aggregation_task(&task, e));
                }
                Ok(())
            },
        );

        let map_reduce = MapReduce::new(new_connection_f, map_f, reduce_f, self.threads);
        map_reduce.run(Arc::new(tasks))
    }
}

/// One task per distinct schema, or one per relation when the schema projects
/// more than [MAX_RELATIONS_PER_SCHEMA_QUERY] distinct relations.
pub fn plan_tasks(
    relation_configs: &[RelationConfig],
    used_schemas: &[CatalogSchema],
) -> Vec<CatalogTask> {
    let mut relations_by_schema: HashMap<SchemaKey, Vec<RelationConfig>> = HashMap::new();
    let mut seen_relations = HashSet::new();
    for relation in relation_configs {
        if seen_relations.insert(relation.reference_key()) {
            relations_by_schema
                .entry(relation.schema_key())
                .or_default()
                .push(relation.clone());
        }
    }

    let mut tasks = Vec::new();
    let mut seen_schemas = HashSet::new();
    for schema in used_schemas {
        let key = schema.key();
        if !seen_schemas.insert(key.clone()) {
            continue;
        }
        let relations = relations_by_schema.remove(&key).unwrap_or_default();
        if relations.len() > MAX_RELATIONS_PER_SCHEMA_QUERY {
            debug!(
                schema = %schema,
                relations = relations.len(),
                "catalog query fans out per relation"
            );
            tasks.extend(relations.into_iter().map(CatalogTask::Relation));
        } else {
            tasks.push(CatalogTask::Schema {
                schema: schema.clone(),
                relations,
            });
        }
    }
    tasks
}
