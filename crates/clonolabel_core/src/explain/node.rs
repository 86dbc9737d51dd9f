use std::fmt;

use super::explainable::{ExplainEntry, Explainable};
use crate::logical::operator::LogicalOperator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainNode {
    pub entry: ExplainEntry,
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    pub fn walk_logical(plan: &LogicalOperator) -> Self {
        let entry = match plan {
            LogicalOperator::Scan(n) => n.node.explain_entry(),
            LogicalOperator::Filter(n) => n.node.explain_entry(),
            LogicalOperator::Project(n) => n.node.explain_entry(),
            LogicalOperator::WithColumns(n) => n.node.explain_entry(),
            LogicalOperator::Window(n) => n.node.explain_entry(),
            LogicalOperator::Join(n) => n.node.explain_entry(),
        };
        let children = plan.children().iter().map(Self::walk_logical).collect();

        ExplainNode { entry, children }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.entry, indent = depth * 2)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExplainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
