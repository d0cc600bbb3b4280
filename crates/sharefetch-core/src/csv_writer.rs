//! CSV output
//!
//! Each non-empty table becomes `<output_dir>/<schema>.<name>.csv`: a header
//! row with the column names followed by one line per row. No index column is
//! added. Fields containing the delimiter, quotes or line breaks are quoted.
//! Nested columns (lists, maps, structs) are written as JSON text.
//!
//! The file is written to a temporary sibling and renamed into place, so a
//! failed write never leaves a partial file or clobbers an earlier one.
//! The output directory must already exist; it is never created here.

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::json::ArrayWriter;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::{Error, Result, TableData};

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// Column name used when encoding a single nested column as JSON
const JSON_FIELD: &str = "v";

/// Path of the CSV file for a table; depends on nothing but its arguments
pub fn csv_path(output_dir: &Path, schema: &str, name: &str) -> PathBuf {
    output_dir.join(format!("{schema}.{name}.csv"))
}

/// Writes `data` as CSV, replacing any existing file at the target path
///
/// Returns the path written.
///
/// # Errors
///
/// - `Io` if the directory does not exist or the file cannot be written
/// - `Arrow` if a batch cannot be encoded
pub fn write_csv(output_dir: &Path, schema: &str, name: &str, data: &TableData) -> Result<PathBuf> {
    let path = csv_path(output_dir, schema, name);
    let tmp = tempfile::Builder::new()
        .prefix(".sharefetch-")
        .suffix(".csv.tmp")
        .tempfile_in(output_dir)
        .map_err(|e| Error::io(&path, e))?;
    let mut out = BufWriter::new(tmp);

    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut out);
        for batch in &data.batches {
            writer.write(&stringify_nested(batch)?)?;
        }
    }

    let tmp = out
        .into_inner()
        .map_err(|e| Error::io(&path, e.into_error()))?;
    tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

    debug!(path = %path.display(), rows = data.num_rows(), "CSV written");
    Ok(path)
}

/// Replaces nested columns with Utf8 columns; other columns pass through
fn stringify_nested(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    if !schema.fields().iter().any(|f| f.data_type().is_nested()) {
        return Ok(batch.clone());
    }

    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if field.data_type().is_nested() {
            let text = match nested_to_json(column) {
                Ok(text) => text,
                Err(e) => {
                    debug!(
                        column = %field.name(),
                        error = %e,
                        "JSON encoding failed, using display format"
                    );
                    nested_to_display(column)?
                }
            };
            fields.push(Field::new(field.name(), DataType::Utf8, true));
            columns.push(text);
        } else {
            fields.push(Field::clone(field));
            columns.push(Arc::clone(column));
        }
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)
        .map_err(Error::from)
}

#[derive(Deserialize)]
struct JsonRow<'a> {
    #[serde(borrow, rename = "v", default)]
    value: Option<&'a RawValue>,
}

/// One JSON document per row; null rows stay null
fn nested_to_json(column: &ArrayRef) -> Result<ArrayRef> {
    let schema = Arc::new(Schema::new(vec![Field::new(
        JSON_FIELD,
        column.data_type().clone(),
        true,
    )]));
    let single = RecordBatch::try_new(schema, vec![Arc::clone(column)])?;

    let mut buf = Vec::new();
    {
        let mut writer = ArrayWriter::new(&mut buf);
        writer.write(&single)?;
        writer.finish()?;
    }

    let rows: Vec<JsonRow<'_>> = if buf.is_empty() {
        Vec::new()
    } else {
        serde_json::from_slice(&buf)?
    };
    if rows.len() != column.len() {
        return Err(ArrowError::JsonError(format!(
            "expected {} JSON rows, got {}",
            column.len(),
            rows.len()
        ))
        .into());
    }
    let values: Vec<Option<&str>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| match row.value {
            Some(raw) if !column.is_null(i) => Some(raw.get()),
            _ => None,
        })
        .collect();
    Ok(Arc::new(StringArray::from(values)))
}

/// Arrow's display rendering, for nested values JSON cannot express
fn nested_to_display(column: &ArrayRef) -> Result<ArrayRef> {
    let formatter = ArrayFormatter::try_new(column.as_ref(), &FormatOptions::default())?;
    let values: Vec<Option<String>> = (0..column.len())
        .map(|i| (!column.is_null(i)).then(|| formatter.value(i).to_string()))
        .collect();
    Ok(Arc::new(StringArray::from(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BooleanArray, Float64Array, Int64Array, Int64Builder, ListArray, MapBuilder, StringArray,
        StructArray,
    };
    use arrow::csv::ReaderBuilder;
    use arrow::datatypes::Int64Type;
    use std::fs::File;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample() -> TableData {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("revenue", DataType::Float64, true),
            Field::new("active", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("Acme"), Some("Globex")])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
            ],
        )
        .unwrap();
        TableData::from_batches(vec![batch])
    }

    #[test]
    fn test_csv_path_is_schema_dot_name() {
        assert_eq!(
            csv_path(Path::new("data/processed"), "public", "companies_2023"),
            PathBuf::from("data/processed/public.companies_2023.csv")
        );
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "public", "companies", &sample()).unwrap();

        assert_eq!(path, dir.path().join("public.companies.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "id,name,revenue,active");
        assert_eq!(lines[1], "1,Acme,1.5,true");
        assert_eq!(lines[2], "2,Globex,,false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_csv_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("public.companies.csv");
        std::fs::write(&target, "stale content that is longer than the new file\n".repeat(20))
            .unwrap();

        write_csv(dir.path(), "public", "companies", &sample()).unwrap();

        let content = std::fs::read_to_string(&target).unwrap();
        assert!(!content.contains("stale"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_csv_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does/not/exist");

        let result = write_csv(&missing, "public", "companies", &sample());
        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(!missing.exists());
    }

    fn nested() -> TableData {
        let tags = ListArray::from_iter_primitive::<Int64Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            None,
        ]);
        let owner = StructArray::from(vec![
            (
                Arc::new(Field::new("a", DataType::Int64, true)),
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
            ),
            (
                Arc::new(Field::new("b", DataType::Utf8, true)),
                Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef,
            ),
        ]);
        let batch = RecordBatch::try_from_iter(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("tags", Arc::new(tags) as ArrayRef),
            ("owner", Arc::new(owner) as ArrayRef),
        ])
        .unwrap();
        TableData::from_batches(vec![batch])
    }

    fn read_back(path: &Path, columns: &[&str]) -> Vec<Vec<Option<String>>> {
        let schema = Arc::new(Schema::new(
            columns
                .iter()
                .map(|c| Field::new(*c, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));
        let reader = ReaderBuilder::new(schema)
            .with_header(true)
            .build(File::open(path).unwrap())
            .unwrap();

        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch.unwrap();
            for i in 0..batch.num_rows() {
                rows.push(
                    (0..batch.num_columns())
                        .map(|c| {
                            let col = batch.column(c).as_any().downcast_ref::<StringArray>().unwrap();
                            (!col.is_null(i)).then(|| col.value(i).to_string())
                        })
                        .collect(),
                );
            }
        }
        rows
    }

    #[test]
    fn test_write_csv_nested_columns_as_json() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "public", "companies", &nested()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some("id,tags,owner"));

        let rows = read_back(&path, &["id", "tags", "owner"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].as_deref(), Some("1"));
        assert_eq!(rows[0][1].as_deref(), Some("[1,2]"));
        assert_eq!(rows[0][2].as_deref(), Some(r#"{"a":1,"b":"x"}"#));
        assert_eq!(rows[1][1], None);
        assert_eq!(rows[1][2].as_deref(), Some(r#"{"a":2,"b":"y"}"#));
    }

    #[test]
    fn test_write_csv_map_column() {
        let mut builder = MapBuilder::new(None, Int64Builder::new(), Int64Builder::new());
        builder.keys().append_value(7);
        builder.values().append_value(42);
        builder.append(true).unwrap();
        let batch = RecordBatch::try_from_iter(vec![(
            "attrs",
            Arc::new(builder.finish()) as ArrayRef,
        )])
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "public",
            "companies",
            &TableData::from_batches(vec![batch]),
        )
        .unwrap();

        let rows = read_back(&path, &["attrs"]);
        let cell = rows[0][0].clone().unwrap();
        assert!(cell.contains('7') && cell.contains("42"), "{cell}");
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        // A directory where the CSV should go makes the final rename fail
        let blocked = dir.path().join("public.companies.csv");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep.txt"), "untouched").unwrap();

        let result = write_csv(dir.path(), "public", "companies", &sample());
        assert!(matches!(result, Err(Error::Io { .. })));

        assert!(blocked.is_dir());
        assert_eq!(
            std::fs::read_to_string(blocked.join("keep.txt")).unwrap(),
            "untouched"
        );
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file left behind");
    }

    #[test]
    fn test_successful_write_leaves_only_target() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("public.companies.csv"), "old\n").unwrap();

        write_csv(dir.path(), "public", "companies", &sample()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["public.companies.csv"]);
    }
}
