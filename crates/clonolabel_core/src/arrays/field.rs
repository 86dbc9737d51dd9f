use std::fmt;

use indexmap::IndexMap;

use super::datatype::DataType;
use crate::errors::{LabelError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Field {
            name: name.into(),
            datatype,
        }
    }
}

/// Ordered mapping of column names to types.
///
/// Column names are unique, pushing an existing name replaces the type in
/// place without changing its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: IndexMap<String, DataType>,
}

impl Schema {
    /// Create a schema from fields, erroring on duplicate names.
    pub fn try_new(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let mut columns = IndexMap::new();
        for field in fields {
            if columns.insert(field.name.clone(), field.datatype).is_some() {
                return Err(LabelError::Config(format!(
                    "Duplicate column name '{}' in schema",
                    field.name
                )));
            }
        }
        Ok(Schema { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn datatype(&self, name: &str) -> Option<DataType> {
        self.columns.get(name).copied()
    }

    /// Like `datatype`, but errors if the column doesn't exist.
    pub fn require(&self, name: &str) -> Result<DataType> {
        self.datatype(name).ok_or_else(|| {
            LabelError::Compile(format!(
                "Missing column '{name}', available columns: {}",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns
            .iter()
            .map(|(name, datatype)| Field::new(name.clone(), *datatype))
    }

    /// Add or replace a column.
    pub fn push(&mut self, field: Field) {
        self.columns.insert(field.name, field.datatype);
    }

    /// Create a new schema containing only the given columns in the given
    /// order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Schema> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let datatype = self.require(name)?;
            if columns.insert(name.to_string(), datatype).is_some() {
                return Err(LabelError::Compile(format!(
                    "Column '{name}' selected more than once"
                )));
            }
        }
        Ok(Schema { columns })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, (name, datatype)) in self.columns.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {datatype}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_rejected() {
        let err = Schema::try_new([
            Field::new("a", DataType::Int32),
            Field::new("a", DataType::Utf8),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate column name 'a'"));
    }

    #[test]
    fn push_replaces_in_place() {
        let mut schema = Schema::try_new([
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::Utf8),
        ])
        .unwrap();
        schema.push(Field::new("a", DataType::Float64));
        schema.push(Field::new("c", DataType::Boolean));

        assert_eq!(vec!["a", "b", "c"], schema.names().collect::<Vec<_>>());
        assert_eq!(Some(DataType::Float64), schema.datatype("a"));
    }

    #[test]
    fn project_reorders() {
        let schema = Schema::try_new([
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::Utf8),
        ])
        .unwrap();
        let projected = schema.project(&["b", "a"]).unwrap();
        assert_eq!("[b: Utf8, a: Int32]", projected.to_string());
        assert!(schema.project(&["z"]).is_err());
    }
}
