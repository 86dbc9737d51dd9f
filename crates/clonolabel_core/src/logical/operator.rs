use super::logical_filter::LogicalFilter;
use super::logical_join::LogicalJoin;
use super::logical_project::{LogicalProject, LogicalWithColumns};
use super::logical_scan::LogicalScan;
use super::logical_window::LogicalWindow;
use crate::arrays::field::Schema;
use crate::errors::{Result, internal};

/// Wrapper around nodes in the logical plan to hold the output schema and
/// inputs of the node.
#[derive(Debug, Clone)]
pub struct Node<N> {
    /// Node specific logic.
    pub node: N,
    /// Output schema of this node.
    pub schema: Schema,
    /// Inputs to this node.
    pub children: Vec<LogicalOperator>,
}

impl<N> Node<N> {
    pub fn get_one_child_exact(&self) -> Result<&LogicalOperator> {
        match self.children.as_slice() {
            [child] => Ok(child),
            other => Err(internal!(
                "Expected 1 child to operator, have {}",
                other.len()
            )),
        }
    }

    pub fn get_two_children_exact(&self) -> Result<(&LogicalOperator, &LogicalOperator)> {
        match self.children.as_slice() {
            [left, right] => Ok((left, right)),
            other => Err(internal!(
                "Expected 2 children to operator, have {}",
                other.len()
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LogicalOperator {
    Scan(Node<LogicalScan>),
    Filter(Node<LogicalFilter>),
    Project(Node<LogicalProject>),
    WithColumns(Node<LogicalWithColumns>),
    Window(Node<LogicalWindow>),
    Join(Node<LogicalJoin>),
}

impl LogicalOperator {
    /// Output schema of the operator.
    pub fn schema(&self) -> &Schema {
        match self {
            Self::Scan(n) => &n.schema,
            Self::Filter(n) => &n.schema,
            Self::Project(n) => &n.schema,
            Self::WithColumns(n) => &n.schema,
            Self::Window(n) => &n.schema,
            Self::Join(n) => &n.schema,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scan(_) => "Scan",
            Self::Filter(_) => "Filter",
            Self::Project(_) => "Project",
            Self::WithColumns(_) => "WithColumns",
            Self::Window(_) => "Window",
            Self::Join(_) => "Join",
        }
    }

    pub fn children(&self) -> &[LogicalOperator] {
        match self {
            Self::Scan(n) => &n.children,
            Self::Filter(n) => &n.children,
            Self::Project(n) => &n.children,
            Self::WithColumns(n) => &n.children,
            Self::Window(n) => &n.children,
            Self::Join(n) => &n.children,
        }
    }
}
