//! In-memory tabular dataset backed by Arrow record batches

use super::schema::{describe, infer_columns, Column, ColumnType};
use super::{SourceError, SourceResult};
use crate::value::{Row, Value};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Rows read from the source, with their inferred column types
///
/// Batches are stored with every column cast to its canonical Arrow type
/// (see [`ColumnType::canonical_arrow`]), so row materialisation only deals
/// with one array type per column kind.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    batches: Vec<RecordBatch>,
    num_rows: usize,
}

impl Dataset {
    /// Build a dataset from record batches that share one schema
    pub fn from_batches(batches: Vec<RecordBatch>) -> SourceResult<Self> {
        Self::from_labelled_batches(
            batches
                .into_iter()
                .map(|batch| (PathBuf::from("<memory>"), batch))
                .collect(),
        )
    }

    /// Same as [`Dataset::from_batches`], with the file each batch came from
    /// for error reporting
    pub(crate) fn from_labelled_batches(
        batches: Vec<(PathBuf, RecordBatch)>,
    ) -> SourceResult<Self> {
        let mut columns: Option<Vec<Column>> = None;
        let mut canonical = Vec::with_capacity(batches.len());
        let mut num_rows = 0;

        for (path, batch) in batches {
            let found = infer_columns(&batch.schema())?;
            match &columns {
                None => columns = Some(found.clone()),
                Some(expected) if *expected != found => {
                    return Err(SourceError::SchemaMismatch {
                        path,
                        expected: describe(expected),
                        found: describe(&found),
                    });
                }
                Some(_) => {}
            }
            num_rows += batch.num_rows();
            canonical.push(canonicalize(&path, &batch, &found)?);
        }

        Ok(Self {
            columns: columns.unwrap_or_default(),
            batches: canonical,
            num_rows,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Iterate the rows in file order
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            dataset: self,
            batch: 0,
            row: 0,
        }
    }

    /// Iterate the rows in groups of at most `size` rows
    pub fn chunks(&self, size: usize) -> RowChunks<'_> {
        RowChunks {
            rows: self.rows(),
            size: size.max(1),
        }
    }
}

fn canonicalize(path: &Path, batch: &RecordBatch, columns: &[Column]) -> SourceResult<RecordBatch> {
    let arrow_err = |source| SourceError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    // Widening must not turn an out-of-range value into null.
    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for (column, array) in columns.iter().zip(batch.columns()) {
        let target = column.column_type.canonical_arrow(array.data_type());
        let array = if *array.data_type() == target {
            Arc::clone(array)
        } else {
            cast_with_options(array, &target, &strict).map_err(arrow_err)?
        };
        fields.push(Field::new(&column.name, target, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(arrow_err)
}

/// Read one cell of a canonical column
fn cell_value(array: &ArrayRef, column_type: ColumnType, i: usize) -> Value {
    if array.is_null(i) {
        return Value::Null;
    }

    let any = array.as_any();
    match column_type {
        ColumnType::String => any
            .downcast_ref::<StringArray>()
            .map(|a| Value::String(a.value(i).to_string()))
            .unwrap_or(Value::Null),
        ColumnType::Integer => any
            .downcast_ref::<Int64Array>()
            .map(|a| Value::Integer(a.value(i)))
            .unwrap_or(Value::Null),
        ColumnType::Float => any
            .downcast_ref::<Float64Array>()
            .map(|a| Value::Float(a.value(i)))
            .unwrap_or(Value::Null),
        ColumnType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Boolean(a.value(i)))
            .unwrap_or(Value::Null),
        ColumnType::Date => any
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(i))
            .map(Value::Date)
            .unwrap_or(Value::Null),
        ColumnType::Timestamp => {
            // Arrow stores zoned timestamps as UTC instants; naive ones are
            // taken to be UTC as well.
            let naive = match array.data_type() {
                DataType::Timestamp(TimeUnit::Second, _) => any
                    .downcast_ref::<TimestampSecondArray>()
                    .and_then(|a| a.value_as_datetime(i)),
                DataType::Timestamp(TimeUnit::Millisecond, _) => any
                    .downcast_ref::<TimestampMillisecondArray>()
                    .and_then(|a| a.value_as_datetime(i)),
                DataType::Timestamp(TimeUnit::Microsecond, _) => any
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .and_then(|a| a.value_as_datetime(i)),
                DataType::Timestamp(TimeUnit::Nanosecond, _) => any
                    .downcast_ref::<TimestampNanosecondArray>()
                    .and_then(|a| a.value_as_datetime(i)),
                _ => None,
            };
            naive
                .map(|dt| Value::Timestamp(dt.and_utc()))
                .unwrap_or(Value::Null)
        }
    }
}

/// Row iterator over a [`Dataset`]
pub struct Rows<'a> {
    dataset: &'a Dataset,
    batch: usize,
    row: usize,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            let batch = self.dataset.batches.get(self.batch)?;
            if self.row >= batch.num_rows() {
                self.batch += 1;
                self.row = 0;
                continue;
            }

            let mut row = Row::new();
            for (column, array) in self.dataset.columns.iter().zip(batch.columns()) {
                row.insert(column.name.clone(), cell_value(array, column.column_type, self.row));
            }
            self.row += 1;
            return Some(row);
        }
    }
}

/// Iterator over fixed-size groups of rows
pub struct RowChunks<'a> {
    rows: Rows<'a>,
    size: usize,
}

impl Iterator for RowChunks<'_> {
    type Item = Vec<Row>;

    fn next(&mut self) -> Option<Vec<Row>> {
        let chunk: Vec<Row> = self.rows.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}
