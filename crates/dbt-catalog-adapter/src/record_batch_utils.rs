use std::sync::Arc;

use arrow::array::{Array, AsArray, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow_schema::DataType;
use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};

use crate::metadata::{TABLE_DATABASE_COLUMN, TABLE_NAME_COLUMN, TABLE_SCHEMA_COLUMN};
use crate::reference_key::ReferenceKey;

pub fn column_by_name<'a>(batch: &'a RecordBatch, name: &str) -> AdapterResult<&'a Arc<dyn Array>> {
    batch.column_by_name(name).ok_or_else(|| {
        let schema = batch.schema();
        let columns = schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>();
        AdapterError::new(
            AdapterErrorKind::Internal,
            format!("expected column {name} not found, available are: {columns:?}"),
        )
    })
}

pub fn get_column_values<T>(record_batch: &RecordBatch, column_name: &str) -> AdapterResult<T>
where
    T: std::any::Any + Clone,
{
    Ok(column_by_name(record_batch, column_name)?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| {
            let schema = record_batch.schema();
            let field = schema.fields().iter().find(|f| f.name() == column_name);
            AdapterError::new(
                AdapterErrorKind::Internal,
                format!(
                    "expected column of type: {} not found, available are: {field:?}",
                    std::any::type_name::<T>()
                ),
            )
        })?
        .to_owned())
}

/// A string column as `Utf8`, casting large and view string columns.
pub fn get_string_column(record_batch: &RecordBatch, column_name: &str) -> AdapterResult<StringArray> {
    let column = column_by_name(record_batch, column_name)?;
    match column.data_type() {
        DataType::Utf8 => get_column_values::<StringArray>(record_batch, column_name),
        DataType::LargeUtf8 | DataType::Utf8View => {
            let casted = cast(column, &DataType::Utf8)?;
            Ok(casted.as_string::<i32>().clone())
        }
        other => Err(AdapterError::new(
            AdapterErrorKind::Internal,
            format!("expected column {column_name} to be a string column, got {other}"),
        )),
    }
}

/// The reference key of every row, in row order.
pub fn reference_keys(batch: &RecordBatch) -> AdapterResult<Vec<ReferenceKey>> {
    let databases = get_string_column(batch, TABLE_DATABASE_COLUMN)?;
    let schemas = get_string_column(batch, TABLE_SCHEMA_COLUMN)?;
    let names = get_string_column(batch, TABLE_NAME_COLUMN)?;
    Ok((0..batch.num_rows())
        .map(|i| ReferenceKey::new(databases.value(i), schemas.value(i), names.value(i)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, LargeStringArray};
    use arrow_schema::{Field, Schema};

    #[test]
    fn reads_keys_from_any_string_encoding() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(TABLE_DATABASE_COLUMN, DataType::Utf8, false),
            Field::new(TABLE_SCHEMA_COLUMN, DataType::LargeUtf8, false),
            Field::new(TABLE_NAME_COLUMN, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["DB", "db"])),
                Arc::new(LargeStringArray::from(vec!["Sch", "sch"])),
                Arc::new(StringArray::from(vec!["A", "b"])),
            ],
        )
        .unwrap();
        let keys = reference_keys(&batch).unwrap();
        assert_eq!(
            keys,
            vec![
                ReferenceKey::new("db", "sch", "a"),
                ReferenceKey::new("db", "sch", "b")
            ]
        );
    }

    #[test]
    fn missing_or_mistyped_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            TABLE_NAME_COLUMN,
            DataType::Int32,
            false,
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1]))]).unwrap();
        let err = reference_keys(&batch).unwrap_err();
        assert!(err.message().contains("expected column table_database not found"));
        let err = get_string_column(&batch, TABLE_NAME_COLUMN).unwrap_err();
        assert!(err.message().contains("string column"));
    }
}
