use tracing::{debug, warn};

use super::filter::compile_filter;
use super::transform::DerivedColumns;
use crate::arrays::datatype::DataType;
use crate::dataset::ColumnarDataset;
use crate::errors::Result;
use crate::expr::{and, case_when, col, is_not_null, is_null, lit, typed_null};
use crate::script::ast::AnnotationStep;

/// Apply steps in order, setting the label of rows that match a step and
/// have no label yet. Rows left without a label are dropped.
///
/// Each step replaces the whole label column, so once a row is labeled no
/// later step can change it.
pub fn apply_steps(
    dataset: ColumnarDataset,
    steps: &[AnnotationStep],
    derived: &DerivedColumns,
    label_column: &str,
) -> Result<ColumnarDataset> {
    if dataset.schema().contains(label_column) {
        warn!(
            column = label_column,
            "input already has a column with the label name, it will be replaced"
        );
    }

    let mut dataset = dataset.with_column(label_column, typed_null(DataType::Utf8))?;

    for (idx, step) in steps.iter().enumerate() {
        let predicate = compile_filter(&step.filter, derived, dataset.schema())
            .map_err(|e| e.in_step(idx, &step.label))?;
        debug!(
            step = idx + 1,
            label = %step.label,
            %predicate,
            columns = ?predicate.column_refs(),
            "compiled step"
        );

        let labeled = case_when(
            and(is_null(col(label_column)), predicate),
            lit(step.label.as_str()),
            col(label_column),
        );
        dataset = dataset
            .with_column(label_column, labeled)
            .map_err(|e| e.in_step(idx, &step.label))?;
    }

    dataset.filter(is_not_null(col(label_column)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::batch::Batch;
    use crate::errors::LabelError;

    fn dataset() -> ColumnarDataset {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("c1"), Some("c2"), Some("c3"), Some("c4")])),
            ("cdr3", Array::from(vec![Some("CASS"), Some("CAW"), Some("CASSW"), None])),
            ("count", Array::from(vec![Some(5_i64), Some(50), Some(500), Some(1)])),
        ])
        .unwrap();
        ColumnarDataset::from_batch("test", batch)
    }

    fn steps(json: &str) -> Vec<AnnotationStep> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_match_wins_and_unlabeled_dropped() {
        let steps = steps(
            r#"[
                {"label": "big", "filter": {"type": "numericalRange", "column": "count", "min": 100}},
                {"label": "cass", "filter": {"type": "pattern", "column": "cdr3",
                    "predicate": {"type": "containSubsequence", "value": "CASS"}}},
                {"label": "mid", "filter": {"type": "numericalRange", "column": "count", "min": 10}}
            ]"#,
        );
        let batch = apply_steps(dataset(), &steps, &DerivedColumns::new(), "label")
            .unwrap()
            .select(["id", "label"])
            .unwrap()
            .collect()
            .unwrap();

        assert_eq!(
            &Array::from(vec![Some("c1"), Some("c2"), Some("c3")]),
            batch.column("id").unwrap()
        );
        assert_eq!(
            &Array::from(vec![Some("cass"), Some("mid"), Some("big")]),
            batch.column("label").unwrap()
        );
    }

    #[test]
    fn no_matches_keeps_schema() {
        let steps = steps(r#"[{"label": "none", "filter": {"type": "or", "filters": []}}]"#);
        let ds = apply_steps(dataset(), &steps, &DerivedColumns::new(), "label").unwrap();
        let batch = ds.collect().unwrap();
        assert_eq!(0, batch.num_rows());
        assert_eq!(
            vec!["id", "cdr3", "count", "label"],
            batch.schema().names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn step_error_carries_index_and_label() {
        let steps = steps(
            r#"[
                {"label": "ok", "filter": {"type": "isNA", "column": "cdr3"}},
                {"label": "bad", "filter": {"type": "pattern", "column": "count",
                    "predicate": {"type": "equals", "value": "5"}}}
            ]"#,
        );
        let err = apply_steps(dataset(), &steps, &DerivedColumns::new(), "label").unwrap_err();
        let LabelError::Step { index, label, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(1, *index);
        assert_eq!("bad", label);
        assert!(err.to_string().starts_with("Step 2 (label 'bad')"), "{err}");
    }
}
