//! Executes logical plans into materialized batches.

pub mod join;
pub mod window;

use tracing::trace;

use crate::arrays::batch::Batch;
use crate::errors::{Result, internal};
use crate::expr::evaluator::{evaluate, evaluate_mask};
use crate::logical::operator::LogicalOperator;

/// Execute a plan, reading every source it scans.
pub fn execute(plan: &LogicalOperator) -> Result<Batch> {
    let batch = match plan {
        LogicalOperator::Scan(n) => {
            let batch = n.node.source.read()?;
            if batch.schema() != &n.schema {
                return Err(internal!(
                    "Source '{}' produced schema {}, planned with {}",
                    n.node.source.name(),
                    batch.schema(),
                    n.schema
                ));
            }
            batch
        }
        LogicalOperator::Filter(n) => {
            let input = execute(n.get_one_child_exact()?)?;
            let mask = evaluate_mask(&n.node.predicate, &input)?;
            input.filter(&mask)?
        }
        LogicalOperator::Project(n) => {
            let input = execute(n.get_one_child_exact()?)?;
            input.project(&n.node.columns)?
        }
        LogicalOperator::WithColumns(n) => {
            let input = execute(n.get_one_child_exact()?)?;
            let arrays = n
                .node
                .exprs
                .iter()
                .map(|named| evaluate(&named.expr, &input))
                .collect::<Result<Vec<_>>>()?;
            n.node
                .exprs
                .iter()
                .zip(arrays)
                .try_fold(input, |batch, (named, array)| {
                    batch.with_column(&named.name, array)
                })?
        }
        LogicalOperator::Window(n) => {
            let input = execute(n.get_one_child_exact()?)?;
            let arrays = n
                .node
                .windows
                .iter()
                .map(|window| window::evaluate_window(&input, window))
                .collect::<Result<Vec<_>>>()?;
            n.node
                .windows
                .iter()
                .zip(arrays)
                .try_fold(input, |batch, (window, array)| {
                    batch.with_column(&window.alias, array)
                })?
        }
        LogicalOperator::Join(n) => {
            let (left, right) = n.get_two_children_exact()?;
            let left = execute(left)?;
            let right = execute(right)?;
            join::hash_join(&left, &right, &n.node.on, n.node.join_type)?
        }
    };

    trace!(operator = plan.name(), rows = batch.num_rows(), "executed operator");

    Ok(batch)
}
