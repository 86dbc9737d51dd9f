use super::operator::{LogicalOperator, Node};
use crate::arrays::datatype::DataType;
use crate::errors::{LabelError, Result};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone)]
pub struct LogicalFilter {
    pub predicate: Expression,
}

impl LogicalFilter {
    /// Plan a filter, checking that the predicate is boolean.
    pub fn plan(input: LogicalOperator, predicate: Expression) -> Result<LogicalOperator> {
        let datatype = predicate.datatype(input.schema())?;
        if datatype != DataType::Boolean {
            return Err(LabelError::Type(format!(
                "Filter predicate '{predicate}' has type {datatype}, expected Boolean"
            )));
        }

        Ok(LogicalOperator::Filter(Node {
            node: LogicalFilter { predicate },
            schema: input.schema().clone(),
            children: vec![input],
        }))
    }
}

impl Explainable for LogicalFilter {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.predicate)
    }
}
