use std::fmt::Debug;

use crate::arrays::batch::Batch;
use crate::arrays::field::Schema;
use crate::errors::Result;

/// A table that can be scanned into a batch.
///
/// The schema must be known without reading any data. Scans happen only when
/// a plan is collected.
pub trait TableSource: Debug + Send + Sync {
    /// Name used in explain output and error messages.
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Read the entire table.
    fn read(&self) -> Result<Batch>;
}

/// A source over an already materialized batch.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    batch: Batch,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, batch: Batch) -> Self {
        MemorySource {
            name: name.into(),
            batch,
        }
    }
}

impl TableSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        self.batch.schema()
    }

    fn read(&self) -> Result<Batch> {
        Ok(self.batch.clone())
    }
}
