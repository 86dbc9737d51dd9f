use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::ColumnarDataset;
use crate::errors::{LabelError, Result};
use crate::expr::{NamedExpression, col, log10};
use crate::logical::logical_window::{SortExpr, WindowExpr, WindowFunction};
use crate::script::ast::{ColumnRef, TransformedColumnSpec};

/// Which table a derived column was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Clonotype,
    Sample,
}

/// Derived columns computed for a single annotation run, keyed by canonical
/// name.
///
/// Filters only ever see a derived column through this map, by name. Each
/// canonical name is computed at most once.
#[derive(Debug, Clone, Default)]
pub struct DerivedColumns {
    columns: BTreeMap<String, (TransformedColumnSpec, TableSide)>,
}

impl DerivedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn side(&self, name: &str) -> Option<TableSide> {
        self.columns.get(name).map(|(_, side)| *side)
    }

    /// Name of the column a reference reads from the base table.
    pub fn resolve(&self, column: &ColumnRef) -> Result<String> {
        match column {
            ColumnRef::Source(name) => Ok(name.clone()),
            ColumnRef::Derived(spec) => {
                let name = spec.canonical_name();
                if !self.contains(&name) {
                    return Err(LabelError::Compile(format!(
                        "Derived column '{name}' was referenced but never computed"
                    )));
                }
                Ok(name)
            }
        }
    }

    /// Add derived columns to a dataset, skipping names already computed.
    ///
    /// Ranks and cumulative sums are partitioned by `group_by` when given.
    /// Rank ties are broken by `unique_key` ascending. Cumulative sums order
    /// by `unique_key` in the same direction as the summed column.
    pub fn compute<'a>(
        &mut self,
        dataset: ColumnarDataset,
        specs: impl IntoIterator<Item = &'a TransformedColumnSpec>,
        side: TableSide,
        group_by: Option<&str>,
        unique_key: &str,
    ) -> Result<ColumnarDataset> {
        let mut windows = Vec::new();
        let mut exprs = Vec::new();

        for spec in specs {
            let name = spec.canonical_name();
            if self.contains(&name) {
                continue;
            }
            match compile_transform(spec, group_by, unique_key) {
                Derivation::Window(window) => windows.push(window),
                Derivation::Expr(expr) => exprs.push(expr),
            }
            debug!(column = %name, ?side, ?group_by, "planned derived column");
            self.columns.insert(name, (spec.clone(), side));
        }

        dataset.window(windows)?.with_columns(exprs)
    }
}

/// How a derived column is computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
    /// Order dependent, computed over a (possibly partitioned) window.
    Window(WindowExpr),
    /// Row-wise expression.
    Expr(NamedExpression),
}

pub fn compile_transform(
    spec: &TransformedColumnSpec,
    group_by: Option<&str>,
    unique_key: &str,
) -> Derivation {
    let alias = spec.canonical_name();
    let ordered = |column: &str,
                   descending: bool,
                   key_descending: bool,
                   function: WindowFunction| {
        Derivation::Window(WindowExpr {
            function,
            partition_by: group_by.map(String::from),
            order_by: vec![
                SortExpr::new(column, descending),
                SortExpr::new(unique_key, key_descending),
            ],
            alias: alias.clone(),
        })
    };

    match spec {
        TransformedColumnSpec::Rank { column, descending } => {
            ordered(column, *descending, false, WindowFunction::RowNumber)
        }
        TransformedColumnSpec::SortedCumulativeSum { column, descending } => ordered(
            column,
            *descending,
            *descending,
            WindowFunction::CumulativeSum {
                column: column.clone(),
            },
        ),
        TransformedColumnSpec::Log10 { column } => {
            Derivation::Expr(NamedExpression::new(alias.clone(), log10(col(column))))
        }
    }
}
