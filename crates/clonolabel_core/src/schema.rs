//! JSON column schemas for input tables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::errors::{LabelError, Result};

/// Column types accepted in schema files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Long,
    Float,
    Double,
    String,
}

impl From<ColumnType> for DataType {
    fn from(value: ColumnType) -> Self {
        match value {
            ColumnType::Int => DataType::Int32,
            ColumnType::Long => DataType::Int64,
            ColumnType::Float => DataType::Float32,
            ColumnType::Double => DataType::Float64,
            ColumnType::String => DataType::Utf8,
        }
    }
}

/// One entry of a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Parse a schema from its JSON text, e.g.
/// `[{"column": "clonotypeKey", "type": "String"}]`.
pub fn parse_schema(json: &str) -> Result<Schema> {
    let columns: Vec<ColumnSchema> = serde_json::from_str(json)?;
    Schema::try_new(
        columns
            .into_iter()
            .map(|c| Field::new(c.column, c.column_type.into())),
    )
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| LabelError::io(path.display().to_string(), e))?;
    let schema = parse_schema(&json).map_err(|e| match e {
        LabelError::Json(e) => LabelError::Config(format!(
            "Failed to decode schema '{}': {e}",
            path.display()
        )),
        other => other,
    })?;
    debug!(path = %path.display(), columns = schema.len(), "loaded schema");
    Ok(schema)
}
