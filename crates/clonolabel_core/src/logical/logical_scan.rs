use std::sync::Arc;

use super::operator::{LogicalOperator, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::storage::source::TableSource;

#[derive(Debug, Clone)]
pub struct LogicalScan {
    pub source: Arc<dyn TableSource>,
}

impl LogicalScan {
    pub fn plan(source: Arc<dyn TableSource>) -> LogicalOperator {
        let schema = source.schema().clone();
        LogicalOperator::Scan(Node {
            node: LogicalScan { source },
            schema,
            children: Vec::new(),
        })
    }
}

impl Explainable for LogicalScan {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Scan")
            .with_value("source", self.source.name())
            .with_values("columns", self.source.schema().names())
    }
}
