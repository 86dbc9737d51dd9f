use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::transform::{DerivedColumns, TableSide};
use crate::arrays::field::Schema;
use crate::dataset::ColumnarDataset;
use crate::errors::{LabelError, Result, TableColumns, internal};
use crate::logical::logical_join::JoinType;
use crate::script::ast::{AnnotationMode, AnnotationScript, TransformedColumnSpec};
use crate::script::resolver::RequiredColumns;
use crate::storage::source::TableSource;

/// Input tables for an annotation run.
#[derive(Debug, Clone, Default)]
pub struct AnnotationInputs {
    /// One row per clonotype.
    pub clonotype: Option<Arc<dyn TableSource>>,
    /// One row per (sample, clonotype) pair.
    pub sample: Option<Arc<dyn TableSource>>,
}

/// The base table with every column the steps need, plus the derived columns
/// that were computed on it.
#[derive(Debug)]
pub struct BaseTable {
    pub dataset: ColumnarDataset,
    pub derived: DerivedColumns,
    /// Sample key, only set in `bySampleAndClonotype` mode.
    pub sample_key: Option<String>,
}

/// Inputs and key columns after applying the mode rules.
struct Layout<'a> {
    clonotype: Option<&'a Arc<dyn TableSource>>,
    sample: Option<&'a Arc<dyn TableSource>>,
    clonotype_key: &'a str,
    sample_key: Option<&'a str>,
}

const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Build the base table for a script.
///
/// Mode, key and column checks all happen before anything is read.
pub fn build_base_table(script: &AnnotationScript, inputs: &AnnotationInputs) -> Result<BaseTable> {
    let layout = check_mode(script, inputs)?;
    check_keys(&layout)?;

    let required = RequiredColumns::for_script(script);
    validate_columns(&required, &layout)?;

    let mut derived = DerivedColumns::new();
    let dataset = match (layout.sample, layout.sample_key) {
        (Some(sample), Some(sample_key)) => {
            sample_base(&layout, sample, sample_key, &required, &mut derived)?
        }
        _ => clonotype_base(&layout, &required, &mut derived)?,
    };

    Ok(BaseTable {
        dataset,
        derived,
        sample_key: layout.sample_key.map(String::from),
    })
}

/// Apply the mode rules, rejecting invalid combinations of mode and inputs.
fn check_mode<'a>(
    script: &'a AnnotationScript,
    inputs: &'a AnnotationInputs,
) -> Result<Layout<'a>> {
    match script.mode {
        AnnotationMode::ByClonotype => {
            let Some(clonotype) = &inputs.clonotype else {
                return Err(LabelError::Config(
                    "Clonotype data must be provided when mode is 'byClonotype'".to_string(),
                ));
            };
            if let Some(sample_key) = &script.sample_key_column {
                warn!(%sample_key, "sampleKeyColumn is ignored when mode is 'byClonotype'");
            }
            if let Some(sample) = &inputs.sample {
                warn!(source = sample.name(), "sample data is ignored when mode is 'byClonotype'");
            }
            info!(mode = %script.mode, "annotating clonotypes");

            Ok(Layout {
                clonotype: Some(clonotype),
                sample: None,
                clonotype_key: &script.clonotype_key_column,
                sample_key: None,
            })
        }
        AnnotationMode::BySampleAndClonotype => {
            let Some(sample_key) = &script.sample_key_column else {
                return Err(LabelError::Config(
                    "'sampleKeyColumn' must be specified when mode is 'bySampleAndClonotype'"
                        .to_string(),
                ));
            };
            let Some(sample) = &inputs.sample else {
                return Err(LabelError::Config(
                    "Sample-clonotype data must be provided when mode is 'bySampleAndClonotype'"
                        .to_string(),
                ));
            };
            info!(
                mode = %script.mode,
                %sample_key,
                join_clonotypes = inputs.clonotype.is_some(),
                "annotating sample clonotypes"
            );

            Ok(Layout {
                clonotype: inputs.clonotype.as_ref(),
                sample: Some(sample),
                clonotype_key: &script.clonotype_key_column,
                sample_key: Some(sample_key),
            })
        }
    }
}

fn check_keys(layout: &Layout) -> Result<()> {
    let missing_key = |key: &str, role: &str, source: &Arc<dyn TableSource>| {
        LabelError::Config(format!(
            "{role} key column '{key}' not found in the schema of '{}'",
            source.name()
        ))
    };

    if let Some(clonotype) = layout.clonotype {
        if !clonotype.schema().contains(layout.clonotype_key) {
            return Err(missing_key(layout.clonotype_key, "Clonotype", clonotype));
        }
    }

    if let (Some(sample), Some(sample_key)) = (layout.sample, layout.sample_key) {
        if !sample.schema().contains(sample_key) {
            return Err(missing_key(sample_key, "Sample", sample));
        }
        // Needed to join, or as the only source of the key.
        if !sample.schema().contains(layout.clonotype_key) {
            return Err(missing_key(layout.clonotype_key, "Clonotype", sample));
        }
    }

    Ok(())
}

/// Check that every required source column exists on some input table.
fn validate_columns(required: &RequiredColumns, layout: &Layout) -> Result<()> {
    let tables: Vec<(&str, &Schema)> = [("clonotype", layout.clonotype), ("sample", layout.sample)]
        .into_iter()
        .filter_map(|(role, source)| source.map(|s| (role, s.schema())))
        .collect();

    if let [(_, clonotype), (_, sample)] = tables.as_slice() {
        let overlap: Vec<_> = sample.names().filter(|n| clonotype.contains(n)).collect();
        // The join key is expected on both tables.
        let overlap: Vec<_> = overlap
            .into_iter()
            .filter(|n| *n != layout.clonotype_key)
            .collect();
        if !overlap.is_empty() {
            warn!(
                columns = %overlap.join(", "),
                "columns appear in both clonotype and sample schemas, using the sample values"
            );
        }
    }

    let available: BTreeSet<&str> = tables
        .iter()
        .flat_map(|(_, schema)| schema.names())
        .collect();
    let missing: Vec<String> = required
        .source
        .iter()
        .filter(|c| !available.contains(c.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        info!(
            columns = required.source.len(),
            derived = required.derived.len(),
            "validated required columns"
        );
        return Ok(());
    }

    let suggestions = missing
        .iter()
        .filter_map(|name| {
            let mut best: Option<(f64, &str)> = None;
            for candidate in &available {
                let score = strsim::jaro(candidate, name);
                if score > SIMILARITY_THRESHOLD && best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, *candidate));
                }
            }
            best.map(|(_, similar)| (name.clone(), similar.to_string()))
        })
        .collect();

    Err(LabelError::MissingColumns {
        missing,
        available: tables
            .iter()
            .map(|(role, schema)| TableColumns {
                table: role.to_string(),
                columns: schema.names().map(String::from).collect(),
            })
            .collect(),
        suggestions,
    })
}

fn clonotype_base(
    layout: &Layout,
    required: &RequiredColumns,
    derived: &mut DerivedColumns,
) -> Result<ColumnarDataset> {
    let Some(clonotype) = layout.clonotype else {
        return Err(internal!("Clonotype table missing for clonotype base"));
    };
    let dataset = ColumnarDataset::scan(clonotype.clone());
    derived.compute(
        dataset,
        required.derived.values(),
        TableSide::Clonotype,
        None,
        layout.clonotype_key,
    )
}

/// Sample table as the base, with derived columns computed per sample and
/// clonotype columns joined on the clonotype key.
fn sample_base(
    layout: &Layout,
    sample: &Arc<dyn TableSource>,
    sample_key: &str,
    required: &RequiredColumns,
    derived: &mut DerivedColumns,
) -> Result<ColumnarDataset> {
    let sample_schema = sample.schema();
    let (sample_specs, clonotype_specs): (Vec<&TransformedColumnSpec>, Vec<_>) = required
        .derived
        .values()
        .partition(|spec| sample_schema.contains(spec.source_column()));

    let dataset = derived.compute(
        ColumnarDataset::scan(sample.clone()),
        sample_specs,
        TableSide::Sample,
        Some(sample_key),
        layout.clonotype_key,
    )?;

    let Some(clonotype) = layout.clonotype else {
        // Validation guarantees every source column of a spec is on the
        // sample table when there is no clonotype table.
        debug_assert!(clonotype_specs.is_empty());
        return Ok(dataset);
    };

    let clonotype_derived: Vec<String> = clonotype_specs
        .iter()
        .map(|spec| spec.canonical_name())
        .collect();
    let clonotype_ds = derived.compute(
        ColumnarDataset::scan(clonotype.clone()),
        clonotype_specs,
        TableSide::Clonotype,
        None,
        layout.clonotype_key,
    )?;

    // Minimal projection: the key plus what the steps need that the sample
    // table does not already have.
    let mut columns = vec![layout.clonotype_key.to_string()];
    columns.extend(
        required
            .source
            .iter()
            .chain(&clonotype_derived)
            .filter(|c| {
                c.as_str() != layout.clonotype_key
                    && clonotype_ds.schema().contains(c)
                    && !sample_schema.contains(c)
            })
            .cloned(),
    );
    let columns: Vec<String> = {
        let mut seen = BTreeSet::new();
        columns.into_iter().filter(|c| seen.insert(c.clone())).collect()
    };

    info!(columns = %columns.join(", "), "joining clonotype columns onto sample table");
    let clonotype_ds = clonotype_ds.select(columns)?;

    dataset.join(clonotype_ds, layout.clonotype_key, JoinType::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::batch::Batch;
    use crate::script::parse_script;
    use crate::storage::source::MemorySource;

    fn clonotypes() -> Arc<dyn TableSource> {
        let batch = Batch::try_from_columns([
            ("ck", Array::from(vec![Some("c1"), Some("c2"), Some("c3")])),
            ("cdr3", Array::from(vec![Some("CASS"), Some("CAW"), None])),
            ("count", Array::from(vec![Some(10_i64), Some(20), Some(30)])),
            ("shared", Array::from(vec![Some("x"), Some("y"), Some("z")])),
        ])
        .unwrap();
        Arc::new(MemorySource::new("clonotypes", batch))
    }

    fn samples() -> Arc<dyn TableSource> {
        let batch = Batch::try_from_columns([
            ("sk", Array::from(vec![Some("s1"), Some("s1"), Some("s2"), Some("s2")])),
            ("ck", Array::from(vec![Some("c1"), Some("c2"), Some("c1"), Some("c9")])),
            ("freq", Array::from(vec![Some(0.1), Some(0.9), Some(0.4), Some(0.6)])),
            ("shared", Array::from(vec![Some("S1"), Some("S2"), Some("S3"), Some("S4")])),
        ])
        .unwrap();
        Arc::new(MemorySource::new("samples", batch))
    }

    fn script(mode: &str, sample_key: Option<&str>, filter: &str) -> AnnotationScript {
        let sample_key = sample_key
            .map(|k| format!(r#""sampleKeyColumn": "{k}","#))
            .unwrap_or_default();
        parse_script(&format!(
            r#"{{"mode": "{mode}", {sample_key} "clonotypeKeyColumn": "ck",
                "steps": [{{"label": "A", "filter": {filter}}}]}}"#
        ))
        .unwrap()
    }

    const CDR3_AND_FREQ_RANK: &str = r#"{"type": "and", "filters": [
        {"type": "isNA", "column": "cdr3"},
        {"type": "isNA", "column": "shared"},
        {"type": "numericalRange", "column": {"transformer": "rank", "column": "freq", "descending": true}, "max": 1},
        {"type": "numericalRange", "column": {"transformer": "rank", "column": "count"}, "max": 1}
    ]}"#;

    #[test]
    fn by_clonotype_requires_clonotype_table() {
        let script = script("byClonotype", None, r#"{"type": "and", "filters": []}"#);
        let inputs = AnnotationInputs {
            clonotype: None,
            sample: Some(samples()),
        };
        let err = build_base_table(&script, &inputs).unwrap_err();
        assert!(matches!(err, LabelError::Config(_)), "{err}");
    }

    #[test]
    fn by_sample_requires_sample_key() {
        let script = script("bySampleAndClonotype", None, r#"{"type": "and", "filters": []}"#);
        let inputs = AnnotationInputs {
            clonotype: Some(clonotypes()),
            sample: Some(samples()),
        };
        let err = build_base_table(&script, &inputs).unwrap_err();
        assert!(err.to_string().contains("sampleKeyColumn"), "{err}");
    }

    #[test]
    fn by_clonotype_ignores_sample_inputs() {
        let script = script("byClonotype", Some("sk"), r#"{"type": "isNA", "column": "cdr3"}"#);
        let inputs = AnnotationInputs {
            clonotype: Some(clonotypes()),
            sample: Some(samples()),
        };
        let base = build_base_table(&script, &inputs).unwrap();
        assert_eq!(None, base.sample_key);
        assert_eq!(3, base.dataset.collect().unwrap().num_rows());
    }

    #[test]
    fn missing_key_column() {
        let mut script = script("byClonotype", None, r#"{"type": "and", "filters": []}"#);
        script.clonotype_key_column = "clonotypeKey".to_string();
        let inputs = AnnotationInputs {
            clonotype: Some(clonotypes()),
            sample: None,
        };
        let err = build_base_table(&script, &inputs).unwrap_err();
        assert!(err.to_string().contains("'clonotypeKey'"), "{err}");
    }

    #[test]
    fn missing_columns_with_suggestion() {
        let script = script("byClonotype", None, r#"{"type": "isNA", "column": "cdr3_aa"}"#);
        let inputs = AnnotationInputs {
            clonotype: Some(clonotypes()),
            sample: None,
        };
        let err = build_base_table(&script, &inputs).unwrap_err();
        let LabelError::MissingColumns {
            missing,
            suggestions,
            ..
        } = &err
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(&vec!["cdr3_aa".to_string()], missing);
        assert_eq!(
            &vec![("cdr3_aa".to_string(), "cdr3".to_string())],
            suggestions
        );
    }

    #[test]
    fn join_preserves_sample_rows() {
        let script = script("bySampleAndClonotype", Some("sk"), CDR3_AND_FREQ_RANK);
        let inputs = AnnotationInputs {
            clonotype: Some(clonotypes()),
            sample: Some(samples()),
        };
        let base = build_base_table(&script, &inputs).unwrap();
        assert_eq!(Some(TableSide::Sample), base.derived.side("freq_rank_desc"));
        assert_eq!(Some(TableSide::Clonotype), base.derived.side("count_rank_asc"));

        let batch = base.dataset.collect().unwrap();
        assert_eq!(4, batch.num_rows());
        // Sample side wins for overlapping columns, and only needed clonotype
        // columns are joined.
        assert_eq!(
            vec![
                "sk",
                "ck",
                "freq",
                "shared",
                "freq_rank_desc",
                "cdr3",
                "count",
                "count_rank_asc"
            ],
            batch.schema().names().collect::<Vec<_>>()
        );
        assert_eq!(
            &Array::from(vec![Some("CASS"), Some("CAW"), Some("CASS"), None]),
            batch.column("cdr3").unwrap()
        );
        // Ranked within each sample.
        assert_eq!(
            &Array::Int64(vec![Some(2), Some(1), Some(2), Some(1)]),
            batch.column("freq_rank_desc").unwrap()
        );
        // Ranked globally on the clonotype table, null for unmatched keys.
        assert_eq!(
            &Array::Int64(vec![Some(1), Some(2), Some(1), None]),
            batch.column("count_rank_asc").unwrap()
        );
    }

    #[test]
    fn sample_only_needs_all_columns() {
        let script = script("bySampleAndClonotype", Some("sk"), CDR3_AND_FREQ_RANK);
        let inputs = AnnotationInputs {
            clonotype: None,
            sample: Some(samples()),
        };
        let err = build_base_table(&script, &inputs).unwrap_err();
        let LabelError::MissingColumns { missing, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(&vec!["cdr3".to_string(), "count".to_string()], missing);
    }
}
