//! Labeling clonotypes with an annotation script.
//!
//! A run builds a base table with every column the script needs, applies the
//! steps in order so that the first matching step labels a row, and keeps
//! only labeled rows with their key columns.

pub mod filter;
pub mod labeler;
pub mod orchestrator;
pub mod output;
pub mod transform;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use self::orchestrator::{AnnotationInputs, build_base_table};
use crate::config::AnnotateConfig;
use crate::dataset::ColumnarDataset;
use crate::errors::{LabelError, Result};
use crate::schema::load_schema;
use crate::script::ast::AnnotationScript;
use crate::script::load_script;
use crate::script::resolver::RequiredColumns;
use crate::storage::source::TableSource;
use crate::storage::tsv::TsvSource;

#[derive(Debug, Clone, Default)]
pub struct Annotator {
    pub config: AnnotateConfig,
}

impl Annotator {
    pub fn new(config: AnnotateConfig) -> Self {
        Annotator { config }
    }

    /// Plan a run without reading any data.
    pub fn plan(
        &self,
        script: &AnnotationScript,
        inputs: &AnnotationInputs,
    ) -> Result<ColumnarDataset> {
        let label_column = self.config.label_column.as_str();
        if label_column == script.clonotype_key_column
            || script.sample_key_column.as_deref() == Some(label_column)
        {
            return Err(LabelError::Config(format!(
                "Label column '{label_column}' conflicts with a key column"
            )));
        }
        let required = RequiredColumns::for_script(script);
        if required.source.contains(label_column) || required.derived.contains_key(label_column) {
            return Err(LabelError::Config(format!(
                "Label column '{label_column}' is read by a step filter, \
                 set 'label_column' to a different name"
            )));
        }

        let base = build_base_table(script, inputs)?;
        let labeled =
            labeler::apply_steps(base.dataset, &script.steps, &base.derived, label_column)?;
        output::project_output(
            labeled,
            base.sample_key.as_deref(),
            &script.clonotype_key_column,
            label_column,
        )
    }
}

/// File locations for a single annotation run.
#[derive(Debug, Clone)]
pub struct AnnotateJob {
    pub clonotype_data: Option<PathBuf>,
    pub clonotype_schema: Option<PathBuf>,
    pub sample_data: Option<PathBuf>,
    pub sample_schema: Option<PathBuf>,
    pub script: PathBuf,
    pub output: PathBuf,
}

impl AnnotateJob {
    /// Build table sources from the data and schema paths.
    ///
    /// Only schemas are read here. Data files are read when the plan runs.
    pub fn load_inputs(&self, config: &AnnotateConfig) -> Result<AnnotationInputs> {
        let open = |role: &str,
                    data: &Option<PathBuf>,
                    schema: &Option<PathBuf>|
         -> Result<Option<Arc<dyn TableSource>>> {
            match (data, schema) {
                (Some(data), Some(schema)) => {
                    let schema = load_schema(schema)?;
                    let source = TsvSource::new(data, schema, config.tsv_options());
                    Ok(Some(Arc::new(source)))
                }
                (Some(data), None) => Err(LabelError::Config(format!(
                    "A schema is required for {role} data '{}'",
                    data.display()
                ))),
                (None, Some(schema)) => {
                    warn!(path = %schema.display(), "{role} schema given without data, ignoring");
                    Ok(None)
                }
                (None, None) => Ok(None),
            }
        };

        let inputs = AnnotationInputs {
            clonotype: open("clonotype", &self.clonotype_data, &self.clonotype_schema)?,
            sample: open("sample-clonotype", &self.sample_data, &self.sample_schema)?,
        };
        if inputs.clonotype.is_none() && inputs.sample.is_none() {
            return Err(LabelError::Config(
                "At least one of clonotype data or sample-clonotype data must be provided"
                    .to_string(),
            ));
        }
        Ok(inputs)
    }

    pub fn plan(&self, annotator: &Annotator) -> Result<ColumnarDataset> {
        let script = load_script(&self.script)?;
        let inputs = self.load_inputs(&annotator.config)?;
        annotator.plan(&script, &inputs)
    }

    /// Run and write the output file. Returns the number of labeled rows.
    pub fn execute(&self, annotator: &Annotator) -> Result<usize> {
        let batch = self.plan(annotator)?.collect()?;
        info!(rows = batch.num_rows(), "annotation complete");
        output::write_output(&batch, &self.output, &annotator.config.tsv_options())
    }

    pub fn explain(&self, annotator: &Annotator) -> Result<String> {
        Ok(self.plan(annotator)?.explain())
    }
}
