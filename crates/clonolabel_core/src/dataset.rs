use std::sync::Arc;

use tracing::debug;

use crate::arrays::batch::Batch;
use crate::arrays::field::Schema;
use crate::errors::Result;
use crate::execution::execute;
use crate::explain::node::ExplainNode;
use crate::expr::{Expression, NamedExpression};
use crate::logical::logical_filter::LogicalFilter;
use crate::logical::logical_join::{JoinType, LogicalJoin};
use crate::logical::logical_project::{LogicalProject, LogicalWithColumns};
use crate::logical::logical_scan::LogicalScan;
use crate::logical::logical_window::{LogicalWindow, WindowExpr};
use crate::logical::operator::LogicalOperator;
use crate::storage::source::{MemorySource, TableSource};

/// A lazy table.
///
/// Each method returns a new dataset wrapping a larger plan. Nothing is read
/// until [`ColumnarDataset::collect`] is called, but every step is type checked
/// against the current schema as it is added.
#[derive(Debug, Clone)]
pub struct ColumnarDataset {
    plan: LogicalOperator,
}

impl ColumnarDataset {
    pub fn scan(source: Arc<dyn TableSource>) -> Self {
        ColumnarDataset {
            plan: LogicalScan::plan(source),
        }
    }

    /// Dataset over an in-memory batch.
    pub fn from_batch(name: impl Into<String>, batch: Batch) -> Self {
        Self::scan(Arc::new(MemorySource::new(name, batch)))
    }

    pub fn schema(&self) -> &Schema {
        self.plan.schema()
    }

    pub fn plan(&self) -> &LogicalOperator {
        &self.plan
    }

    /// Keep rows where the predicate is true. Null counts as false.
    pub fn filter(self, predicate: Expression) -> Result<Self> {
        Ok(ColumnarDataset {
            plan: LogicalFilter::plan(self.plan, predicate)?,
        })
    }

    pub fn select<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns = columns.into_iter().map(Into::into).collect();
        Ok(ColumnarDataset {
            plan: LogicalProject::plan(self.plan, columns)?,
        })
    }

    pub fn with_columns(self, exprs: Vec<NamedExpression>) -> Result<Self> {
        if exprs.is_empty() {
            return Ok(self);
        }
        Ok(ColumnarDataset {
            plan: LogicalWithColumns::plan(self.plan, exprs)?,
        })
    }

    pub fn with_column(self, name: impl Into<String>, expr: Expression) -> Result<Self> {
        self.with_columns(vec![NamedExpression::new(name, expr)])
    }

    pub fn window(self, windows: Vec<WindowExpr>) -> Result<Self> {
        if windows.is_empty() {
            return Ok(self);
        }
        Ok(ColumnarDataset {
            plan: LogicalWindow::plan(self.plan, windows)?,
        })
    }

    pub fn join(self, right: ColumnarDataset, on: &str, join_type: JoinType) -> Result<Self> {
        Ok(ColumnarDataset {
            plan: LogicalJoin::plan(self.plan, right.plan, on, join_type)?,
        })
    }

    /// Render the plan as an indented tree, root first.
    pub fn explain(&self) -> String {
        ExplainNode::walk_logical(&self.plan).to_string()
    }

    /// Execute the plan.
    pub fn collect(&self) -> Result<Batch> {
        debug!(plan = %self.explain(), "collecting dataset");
        execute(&self.plan)
    }
}
