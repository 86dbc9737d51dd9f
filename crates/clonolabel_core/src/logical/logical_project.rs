use super::operator::{LogicalOperator, Node};
use crate::arrays::field::Field;
use crate::errors::Result;
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::NamedExpression;

/// Select a subset of columns by name, in the given order.
#[derive(Debug, Clone)]
pub struct LogicalProject {
    pub columns: Vec<String>,
}

impl LogicalProject {
    pub fn plan(input: LogicalOperator, columns: Vec<String>) -> Result<LogicalOperator> {
        let schema = input.schema().project(&columns)?;
        Ok(LogicalOperator::Project(Node {
            node: LogicalProject { columns },
            schema,
            children: vec![input],
        }))
    }
}

impl Explainable for LogicalProject {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Project").with_values("columns", &self.columns)
    }
}

/// Add or replace columns computed from expressions.
///
/// All expressions are evaluated against the input, not against each other's
/// output.
#[derive(Debug, Clone)]
pub struct LogicalWithColumns {
    pub exprs: Vec<NamedExpression>,
}

impl LogicalWithColumns {
    pub fn plan(input: LogicalOperator, exprs: Vec<NamedExpression>) -> Result<LogicalOperator> {
        let mut schema = input.schema().clone();
        for named in &exprs {
            let datatype = named.expr.datatype(input.schema())?;
            schema.push(Field::new(&named.name, datatype));
        }

        Ok(LogicalOperator::WithColumns(Node {
            node: LogicalWithColumns { exprs },
            schema,
            children: vec![input],
        }))
    }
}

impl Explainable for LogicalWithColumns {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("WithColumns").with_values(
            "exprs",
            self.exprs
                .iter()
                .map(|named| format!("{} AS {}", named.expr, named.name)),
        )
    }
}
