use std::path::Path;

use tracing::info;

use crate::arrays::batch::Batch;
use crate::dataset::ColumnarDataset;
use crate::errors::Result;
use crate::storage::tsv::{TsvOptions, write_tsv_file};

/// Output columns: the sample key (if any), the clonotype key and the label.
pub fn output_columns(
    sample_key: Option<&str>,
    clonotype_key: &str,
    label_column: &str,
) -> Vec<String> {
    sample_key
        .into_iter()
        .chain([clonotype_key, label_column])
        .map(String::from)
        .collect()
}

pub fn project_output(
    dataset: ColumnarDataset,
    sample_key: Option<&str>,
    clonotype_key: &str,
    label_column: &str,
) -> Result<ColumnarDataset> {
    dataset.select(output_columns(sample_key, clonotype_key, label_column))
}

/// Write the labeled rows, returning how many were written.
pub fn write_output(batch: &Batch, path: &Path, options: &TsvOptions) -> Result<usize> {
    let rows = write_tsv_file(batch, path, options)?;
    info!(path = %path.display(), rows, "wrote labeled rows");
    Ok(rows)
}
