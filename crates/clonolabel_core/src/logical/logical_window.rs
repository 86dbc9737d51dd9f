use std::fmt;

use super::operator::{LogicalOperator, Node};
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::errors::{LabelError, Result};
use crate::explain::explainable::{ExplainEntry, Explainable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFunction {
    /// Position of the row within its partition after ordering, starting at 1.
    RowNumber,
    /// Running sum of `column` over the ordered partition.
    CumulativeSum { column: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpr {
    pub column: String,
    pub descending: bool,
}

impl SortExpr {
    pub fn new(column: impl Into<String>, descending: bool) -> Self {
        SortExpr {
            column: column.into(),
            descending,
        }
    }
}

impl fmt::Display for SortExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "DESC" } else { "ASC" };
        write!(f, "#{} {dir}", self.column)
    }
}

/// A window computation producing one output column.
///
/// Rows whose leading sort key is null are not part of the ordering and get a
/// null output. For cumulative sums, rows with a null summed value also get a
/// null output and do not contribute to the running total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowExpr {
    pub function: WindowFunction,
    pub partition_by: Option<String>,
    pub order_by: Vec<SortExpr>,
    pub alias: String,
}

impl WindowExpr {
    /// Type check against the input schema, returning the output type.
    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        if let Some(partition) = &self.partition_by {
            schema.require(partition)?;
        }
        if self.order_by.is_empty() {
            return Err(LabelError::Compile(format!(
                "Window '{}' requires at least one ORDER BY column",
                self.alias
            )));
        }
        for sort in &self.order_by {
            schema.require(&sort.column)?;
        }

        match &self.function {
            WindowFunction::RowNumber => Ok(DataType::Int64),
            WindowFunction::CumulativeSum { column } => {
                let datatype = schema.require(column)?;
                if datatype.is_integer() {
                    Ok(DataType::Int64)
                } else if datatype.is_float() {
                    Ok(DataType::Float64)
                } else {
                    Err(LabelError::Type(format!(
                        "Cumulative sum requires a numeric column, '{column}' has type {datatype}"
                    )))
                }
            }
        }
    }
}

impl fmt::Display for WindowExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            WindowFunction::RowNumber => write!(f, "row_number() OVER (")?,
            WindowFunction::CumulativeSum { column } => write!(f, "cumsum(#{column}) OVER (")?,
        }
        if let Some(partition) = &self.partition_by {
            write!(f, "PARTITION BY #{partition} ")?;
        }
        write!(f, "ORDER BY ")?;
        for (idx, sort) in self.order_by.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{sort}")?;
        }
        write!(f, ") AS {}", self.alias)
    }
}

#[derive(Debug, Clone)]
pub struct LogicalWindow {
    /// All window expressions.
    pub windows: Vec<WindowExpr>,
}

impl LogicalWindow {
    pub fn plan(input: LogicalOperator, windows: Vec<WindowExpr>) -> Result<LogicalOperator> {
        let mut schema = input.schema().clone();
        for window in &windows {
            let datatype = window.datatype(input.schema())?;
            schema.push(Field::new(&window.alias, datatype));
        }

        Ok(LogicalOperator::Window(Node {
            node: LogicalWindow { windows },
            schema,
            children: vec![input],
        }))
    }
}

impl Explainable for LogicalWindow {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Window").with_values("windows", &self.windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::try_new([
            Field::new("id", DataType::Utf8),
            Field::new("count", DataType::Int32),
            Field::new("freq", DataType::Float32),
        ])
        .unwrap()
    }

    #[test]
    fn cumsum_output_types() {
        let schema = schema();
        let window = |column: &str| WindowExpr {
            function: WindowFunction::CumulativeSum {
                column: column.to_string(),
            },
            partition_by: None,
            order_by: vec![SortExpr::new(column, false), SortExpr::new("id", false)],
            alias: "out".to_string(),
        };
        assert_eq!(DataType::Int64, window("count").datatype(&schema).unwrap());
        assert_eq!(DataType::Float64, window("freq").datatype(&schema).unwrap());
        window("id").datatype(&schema).unwrap_err();
    }

    #[test]
    fn display() {
        let window = WindowExpr {
            function: WindowFunction::RowNumber,
            partition_by: Some("sample".to_string()),
            order_by: vec![SortExpr::new("count", true), SortExpr::new("id", false)],
            alias: "count_rank_desc".to_string(),
        };
        assert_eq!(
            "row_number() OVER (PARTITION BY #sample ORDER BY #count DESC, #id ASC) AS count_rank_desc",
            window.to_string()
        );
    }
}
