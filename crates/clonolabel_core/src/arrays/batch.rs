use super::array::Array;
use super::datatype::DataType;
use super::field::{Field, Schema};
use crate::errors::{LabelError, Result};

/// A materialized table: a schema plus one array per column, all of the same
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    schema: Schema,
    arrays: Vec<Array>,
    num_rows: usize,
}

impl Batch {
    /// Create a new batch, checking that arrays line up with the schema.
    pub fn try_new(schema: Schema, arrays: Vec<Array>) -> Result<Self> {
        if schema.len() != arrays.len() {
            return Err(LabelError::Execution(format!(
                "Schema has {} columns, but got {} arrays",
                schema.len(),
                arrays.len()
            )));
        }

        let num_rows = arrays.first().map(|a| a.len()).unwrap_or(0);
        for (field, array) in schema.fields().zip(&arrays) {
            if array.len() != num_rows {
                return Err(LabelError::Execution(format!(
                    "Column '{}' has {} rows, expected {num_rows}",
                    field.name,
                    array.len()
                )));
            }
            if array.datatype() != field.datatype {
                return Err(LabelError::Execution(format!(
                    "Column '{}' has type {}, expected {}",
                    field.name,
                    array.datatype(),
                    field.datatype
                )));
            }
        }

        Ok(Batch {
            schema,
            arrays,
            num_rows,
        })
    }

    /// Create a batch from (name, array) pairs.
    pub fn try_from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Array)>,
    ) -> Result<Self> {
        let (fields, arrays): (Vec<_>, Vec<_>) = columns
            .into_iter()
            .map(|(name, array)| (Field::new(name, array.datatype()), array))
            .unzip();
        Self::try_new(Schema::try_new(fields)?, arrays)
    }

    /// An empty batch with the given schema.
    pub fn empty(schema: Schema) -> Self {
        let arrays = schema
            .fields()
            .map(|f| Array::new_null(f.datatype, 0))
            .collect();
        Batch {
            schema,
            arrays,
            num_rows: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn arrays(&self) -> &[Array] {
        &self.arrays
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column(&self, name: &str) -> Result<&Array> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| LabelError::Execution(format!("Missing column '{name}' in batch")))?;
        Ok(&self.arrays[idx])
    }

    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Batch> {
        let schema = self.schema.project(names)?;
        let arrays = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Batch {
            schema,
            arrays,
            num_rows: self.num_rows,
        })
    }

    /// Keep only rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Batch> {
        if mask.len() != self.num_rows {
            return Err(LabelError::Execution(format!(
                "Filter mask has {} rows, batch has {}",
                mask.len(),
                self.num_rows
            )));
        }
        let arrays = self.arrays.iter().map(|a| a.filter(mask)).collect();
        let num_rows = mask.iter().filter(|&&keep| keep).count();
        Ok(Batch {
            schema: self.schema.clone(),
            arrays,
            num_rows,
        })
    }

    /// Add a column, replacing an existing column with the same name.
    pub fn with_column(mut self, name: &str, array: Array) -> Result<Batch> {
        if array.len() != self.num_rows && !self.arrays.is_empty() {
            return Err(LabelError::Execution(format!(
                "Column '{name}' has {} rows, batch has {}",
                array.len(),
                self.num_rows
            )));
        }
        if self.arrays.is_empty() {
            self.num_rows = array.len();
        }

        self.schema.push(Field::new(name, array.datatype()));
        match self.schema.index_of(name) {
            Some(idx) if idx < self.arrays.len() => self.arrays[idx] = array,
            _ => self.arrays.push(array),
        }
        Ok(self)
    }

    pub fn datatype(&self, name: &str) -> Option<DataType> {
        self.schema.datatype(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_batch() -> Batch {
        Batch::try_from_columns([
            ("id", Array::from(vec![Some("a"), Some("b"), Some("c")])),
            ("count", Array::from(vec![Some(1_i64), None, Some(3)])),
        ])
        .unwrap()
    }

    #[test]
    fn mismatched_lengths() {
        Batch::try_from_columns([
            ("a", Array::from(vec![Some(1_i64)])),
            ("b", Array::from(vec![Some(1_i64), Some(2)])),
        ])
        .unwrap_err();
    }

    #[test]
    fn filter_rows() {
        let batch = test_batch().filter(&[true, false, true]).unwrap();
        assert_eq!(2, batch.num_rows());
        assert_eq!(
            &Array::from(vec![Some(1_i64), Some(3)]),
            batch.column("count").unwrap()
        );
    }

    #[test]
    fn with_column_replaces() {
        let batch = test_batch()
            .with_column("count", Array::from(vec![Some(7.0), Some(8.0), None]))
            .unwrap();
        assert_eq!(vec!["id", "count"], batch.schema().names().collect::<Vec<_>>());
        assert_eq!(Some(DataType::Float64), batch.datatype("count"));

        let batch = batch
            .with_column("label", Array::from(vec![None, Some("x"), None]))
            .unwrap();
        assert_eq!(3, batch.arrays().len());
    }

    #[test]
    fn project_columns() {
        let batch = test_batch().project(&["count"]).unwrap();
        assert_eq!(1, batch.arrays().len());
        assert_eq!(3, batch.num_rows());
    }
}
