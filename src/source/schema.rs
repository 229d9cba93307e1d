//! Column type inference from Arrow schemas

use super::{SourceError, SourceResult};
use arrow::datatypes::{DataType, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Map an Arrow type to a column type, or `None` when unsupported
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 => Some(ColumnType::String),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Some(ColumnType::Integer),
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _) => Some(ColumnType::Float),
            DataType::Boolean => Some(ColumnType::Boolean),
            DataType::Date32 | DataType::Date64 => Some(ColumnType::Date),
            DataType::Timestamp(_, _) => Some(ColumnType::Timestamp),
            _ => None,
        }
    }

    /// Arrow type columns of this kind are normalised to after reading.
    ///
    /// Timestamps keep their unit and zone, every other kind has a single
    /// canonical representation.
    pub fn canonical_arrow(&self, source: &DataType) -> DataType {
        match self {
            ColumnType::String => DataType::Utf8,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Date => DataType::Date32,
            ColumnType::Timestamp => source.clone(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        };
        write!(f, "{}", name)
    }
}

/// A named, typed source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.column_type)
    }
}

/// Infer the column list of an Arrow schema
pub fn infer_columns(schema: &Schema) -> SourceResult<Vec<Column>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            ColumnType::from_arrow(field.data_type())
                .map(|column_type| Column {
                    name: field.name().clone(),
                    column_type,
                })
                .ok_or_else(|| SourceError::UnsupportedType {
                    column: field.name().clone(),
                    data_type: field.data_type().to_string(),
                })
        })
        .collect()
}

pub(crate) fn describe(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
