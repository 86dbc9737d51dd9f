use std::collections::{BTreeMap, BTreeSet};

use super::ast::{
    AnnotationMode, AnnotationScript, AnnotationStep, ColumnRef, FilterExpression, Operand,
    TransformedColumnSpec,
};

/// Columns a filter or script needs from its input tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredColumns {
    /// Source columns, including the source column of every derived column.
    pub source: BTreeSet<String>,
    /// Derived columns keyed by canonical name.
    pub derived: BTreeMap<String, TransformedColumnSpec>,
}

impl RequiredColumns {
    pub fn for_filter(filter: &FilterExpression) -> Self {
        let mut required = RequiredColumns::default();
        required.add_filter(filter);
        required
    }

    /// Columns referenced by the filters of all steps.
    pub fn for_steps(steps: &[AnnotationStep]) -> Self {
        let mut required = RequiredColumns::default();
        for step in steps {
            required.add_filter(&step.filter);
        }
        required
    }

    /// Columns for a whole script, including the key columns. The sample key
    /// only counts in `bySampleAndClonotype` mode.
    pub fn for_script(script: &AnnotationScript) -> Self {
        let mut required = Self::for_steps(&script.steps);
        required.source.insert(script.clonotype_key_column.clone());
        if let (AnnotationMode::BySampleAndClonotype, Some(sample_key)) =
            (script.mode, &script.sample_key_column)
        {
            required.source.insert(sample_key.clone());
        }
        required
    }

    fn add_filter(&mut self, filter: &FilterExpression) {
        match filter {
            FilterExpression::Pattern { column, .. }
            | FilterExpression::NumericalRange { column, .. }
            | FilterExpression::IsNa { column } => self.add_ref(column),
            FilterExpression::NumericalComparison { lhs, rhs, .. } => {
                for operand in [lhs, rhs] {
                    if let Operand::Column(column) = operand {
                        self.add_ref(column);
                    }
                }
            }
            FilterExpression::And { filters } | FilterExpression::Or { filters } => {
                for filter in filters {
                    self.add_filter(filter);
                }
            }
            FilterExpression::Not { filter } => self.add_filter(filter),
        }
    }

    fn add_ref(&mut self, column: &ColumnRef) {
        self.source.insert(column.source_column().to_string());
        if let ColumnRef::Derived(spec) = column {
            self.derived
                .entry(spec.canonical_name())
                .or_insert_with(|| spec.clone());
        }
    }
}
