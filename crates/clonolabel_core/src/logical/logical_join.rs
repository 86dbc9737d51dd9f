use std::fmt;

use super::operator::{LogicalOperator, Node};
use crate::arrays::field::Schema;
use crate::errors::{LabelError, Result};
use crate::explain::explainable::{ExplainEntry, Explainable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Standard LEFT join.
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "LEFT"),
        }
    }
}

/// Equality join on a single key column present on both sides.
///
/// The right side is expected to be unique on the key. If it is not, the first
/// matching right row is used, so every left row appears at most once in the
/// output. Null keys never match.
#[derive(Debug, Clone)]
pub struct LogicalJoin {
    pub on: String,
    pub join_type: JoinType,
}

impl LogicalJoin {
    pub fn plan(
        left: LogicalOperator,
        right: LogicalOperator,
        on: impl Into<String>,
        join_type: JoinType,
    ) -> Result<LogicalOperator> {
        let on = on.into();
        let schema = join_schema(left.schema(), right.schema(), &on)?;

        Ok(LogicalOperator::Join(Node {
            node: LogicalJoin { on, join_type },
            schema,
            children: vec![left, right],
        }))
    }
}

/// Output schema of a join: all left columns followed by the right columns
/// except the key.
pub fn join_schema(left: &Schema, right: &Schema, on: &str) -> Result<Schema> {
    let left_type = left.require(on)?;
    let right_type = right.require(on)?;
    if left_type != right_type {
        return Err(LabelError::Type(format!(
            "Join key '{on}' has type {left_type} on the left and {right_type} on the right"
        )));
    }

    let mut schema = left.clone();
    for field in right.fields().filter(|f| f.name != on) {
        if schema.contains(&field.name) {
            return Err(LabelError::Compile(format!(
                "Column '{}' exists on both sides of the join on '{on}'",
                field.name
            )));
        }
        schema.push(field);
    }

    Ok(schema)
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Join")
            .with_value("join_type", self.join_type)
            .with_value("on", format!("#{}", self.on))
    }
}
