//! Parquet decoding and projection onto the table schema
//!
//! Data files of a shared table do not have to agree with each other or with
//! the table schema: partition columns usually live only in the file's
//! `partitionValues`, and older files may miss columns added later. Every
//! decoded batch is therefore projected onto the table's column order:
//! - columns present in the file are kept as decoded
//! - partition columns are filled from the partition value, cast to the
//!   declared type (falling back to strings when the cast is not possible)
//! - anything else becomes a null column

use arrow::array::{new_null_array, Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;
use sharefetch_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::SchemaField;

/// Rows per decoded batch
const BATCH_SIZE: usize = 8192;

/// Decodes a complete parquet file held in memory
pub fn decode_parquet(data: Bytes) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .and_then(|b| b.with_batch_size(BATCH_SIZE).build())
        .map_err(|e| Error::fetch(format!("Invalid parquet file: {e}")))?;

    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Maps a Delta column type onto the Arrow type used for synthesized columns
///
/// Nested and unknown types map to `Utf8`.
pub fn delta_type_to_arrow(data_type: &Value) -> DataType {
    let Some(name) = data_type.as_str() else {
        return DataType::Utf8;
    };

    match name {
        "string" => DataType::Utf8,
        "long" => DataType::Int64,
        "integer" => DataType::Int32,
        "short" => DataType::Int16,
        "byte" => DataType::Int8,
        "float" => DataType::Float32,
        "double" => DataType::Float64,
        "boolean" => DataType::Boolean,
        "binary" => DataType::Binary,
        "date" => DataType::Date32,
        "timestamp" => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        "timestamp_ntz" => DataType::Timestamp(TimeUnit::Microsecond, None),
        other => parse_decimal(other).unwrap_or(DataType::Utf8),
    }
}

/// `decimal(p,s)` → `Decimal128(p, s)`
fn parse_decimal(name: &str) -> Option<DataType> {
    let inner = name.strip_prefix("decimal(")?.strip_suffix(')')?;
    let (precision, scale) = inner.split_once(',')?;
    Some(DataType::Decimal128(
        precision.trim().parse().ok()?,
        scale.trim().parse().ok()?,
    ))
}

/// Projects `batch` onto `fields`, synthesizing partition and missing columns
pub fn project_batch(
    batch: &RecordBatch,
    fields: &[SchemaField],
    partition_values: &HashMap<String, Option<String>>,
) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let source_schema = batch.schema();

    let mut out_fields = Vec::with_capacity(fields.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let column = match source_schema.index_of(&field.name) {
            Ok(idx) => Arc::clone(batch.column(idx)),
            Err(_) => {
                let target = delta_type_to_arrow(&field.data_type);
                match partition_values.get(&field.name) {
                    Some(value) => partition_column(value.as_deref(), &target, num_rows)?,
                    None => new_null_array(&target, num_rows),
                }
            }
        };
        out_fields.push(Field::new(&field.name, column.data_type().clone(), true));
        columns.push(column);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(out_fields)), columns, &options)
        .map_err(Error::from)
}

/// A constant column holding one partition value
fn partition_column(value: Option<&str>, target: &DataType, num_rows: usize) -> Result<ArrayRef> {
    let Some(value) = value else {
        return Ok(new_null_array(target, num_rows));
    };

    let strings: ArrayRef = Arc::new(StringArray::from(vec![value; num_rows]));
    if target == &DataType::Utf8 {
        return Ok(strings);
    }

    match cast(strings.as_ref(), target) {
        Ok(array) if array.null_count() == 0 => Ok(array),
        // Unparseable for the declared type: keep the raw text
        _ => Ok(strings),
    }
}
