use std::cmp::Ordering;

use super::datatype::DataType;
use super::key::GroupKey;
use super::scalar::ScalarValue;
use crate::errors::{LabelError, Result};

/// A nullable column of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Boolean(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

/// Apply the same expression to the inner vec of any variant, producing an
/// array of the same variant.
macro_rules! map_values {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            Array::Boolean($values) => Array::Boolean($body),
            Array::Int32($values) => Array::Int32($body),
            Array::Int64($values) => Array::Int64($body),
            Array::Float32($values) => Array::Float32($body),
            Array::Float64($values) => Array::Float64($body),
            Array::Utf8($values) => Array::Utf8($body),
        }
    };
}

/// Evaluate an expression against the inner vec of any variant.
macro_rules! with_values {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            Array::Boolean($values) => $body,
            Array::Int32($values) => $body,
            Array::Int64($values) => $body,
            Array::Float32($values) => $body,
            Array::Float64($values) => $body,
            Array::Utf8($values) => $body,
        }
    };
}

impl Array {
    pub fn with_capacity(datatype: DataType, capacity: usize) -> Self {
        match datatype {
            DataType::Boolean => Array::Boolean(Vec::with_capacity(capacity)),
            DataType::Int32 => Array::Int32(Vec::with_capacity(capacity)),
            DataType::Int64 => Array::Int64(Vec::with_capacity(capacity)),
            DataType::Float32 => Array::Float32(Vec::with_capacity(capacity)),
            DataType::Float64 => Array::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => Array::Utf8(Vec::with_capacity(capacity)),
        }
    }

    pub fn new_null(datatype: DataType, len: usize) -> Self {
        match datatype {
            DataType::Boolean => Array::Boolean(vec![None; len]),
            DataType::Int32 => Array::Int32(vec![None; len]),
            DataType::Int64 => Array::Int64(vec![None; len]),
            DataType::Float32 => Array::Float32(vec![None; len]),
            DataType::Float64 => Array::Float64(vec![None; len]),
            DataType::Utf8 => Array::Utf8(vec![None; len]),
        }
    }

    /// Create an array by repeating a scalar `len` times.
    pub fn repeat(value: &ScalarValue, len: usize) -> Result<Self> {
        Ok(match value {
            ScalarValue::Null => {
                return Err(LabelError::Type(
                    "Cannot create an array from an untyped NULL".to_string(),
                ));
            }
            ScalarValue::Boolean(v) => Array::Boolean(vec![Some(*v); len]),
            ScalarValue::Int32(v) => Array::Int32(vec![Some(*v); len]),
            ScalarValue::Int64(v) => Array::Int64(vec![Some(*v); len]),
            ScalarValue::Float32(v) => Array::Float32(vec![Some(*v); len]),
            ScalarValue::Float64(v) => Array::Float64(vec![Some(*v); len]),
            ScalarValue::Utf8(v) => Array::Utf8(vec![Some(v.clone()); len]),
        })
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, idx: usize) -> bool {
        with_values!(self, values => values[idx].is_none())
    }

    /// Append a value. The value must match the array type, or be null.
    pub fn push(&mut self, value: ScalarValue) -> Result<()> {
        match (self, value) {
            (Self::Boolean(v), ScalarValue::Null) => v.push(None),
            (Self::Int32(v), ScalarValue::Null) => v.push(None),
            (Self::Int64(v), ScalarValue::Null) => v.push(None),
            (Self::Float32(v), ScalarValue::Null) => v.push(None),
            (Self::Float64(v), ScalarValue::Null) => v.push(None),
            (Self::Utf8(v), ScalarValue::Null) => v.push(None),
            (Self::Boolean(v), ScalarValue::Boolean(x)) => v.push(Some(x)),
            (Self::Int32(v), ScalarValue::Int32(x)) => v.push(Some(x)),
            (Self::Int64(v), ScalarValue::Int64(x)) => v.push(Some(x)),
            (Self::Float32(v), ScalarValue::Float32(x)) => v.push(Some(x)),
            (Self::Float64(v), ScalarValue::Float64(x)) => v.push(Some(x)),
            (Self::Utf8(v), ScalarValue::Utf8(x)) => v.push(Some(x)),
            (array, value) => {
                return Err(LabelError::Type(format!(
                    "Cannot push {value} to array of type {}",
                    array.datatype()
                )));
            }
        }
        Ok(())
    }

    /// Gather values by index.
    pub fn take(&self, indices: &[usize]) -> Array {
        map_values!(self, values => indices.iter().map(|&idx| values[idx].clone()).collect())
    }

    /// Gather values by index, producing nulls for `None` indices.
    pub fn take_optional(&self, indices: &[Option<usize>]) -> Array {
        map_values!(self, values => indices
            .iter()
            .map(|idx| idx.and_then(|idx| values[idx].clone()))
            .collect())
    }

    /// Keep only rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Array {
        map_values!(self, values => values
            .iter()
            .zip(mask)
            .filter_map(|(v, &keep)| keep.then(|| v.clone()))
            .collect())
    }

    /// Pick values from `then` where `mask` is true, otherwise from
    /// `otherwise`.
    pub fn select(mask: &[bool], then: &Array, otherwise: &Array) -> Result<Array> {
        fn zip_select<T: Clone>(
            mask: &[bool],
            then: &[Option<T>],
            otherwise: &[Option<T>],
        ) -> Vec<Option<T>> {
            mask.iter()
                .zip(then.iter().zip(otherwise))
                .map(|(&m, (a, b))| if m { a.clone() } else { b.clone() })
                .collect()
        }

        Ok(match (then, otherwise) {
            (Self::Boolean(a), Self::Boolean(b)) => Self::Boolean(zip_select(mask, a, b)),
            (Self::Int32(a), Self::Int32(b)) => Self::Int32(zip_select(mask, a, b)),
            (Self::Int64(a), Self::Int64(b)) => Self::Int64(zip_select(mask, a, b)),
            (Self::Float32(a), Self::Float32(b)) => Self::Float32(zip_select(mask, a, b)),
            (Self::Float64(a), Self::Float64(b)) => Self::Float64(zip_select(mask, a, b)),
            (Self::Utf8(a), Self::Utf8(b)) => Self::Utf8(zip_select(mask, a, b)),
            (a, b) => {
                return Err(LabelError::Type(format!(
                    "Cannot select between arrays of type {} and {}",
                    a.datatype(),
                    b.datatype()
                )));
            }
        })
    }

    /// Numeric values promoted to f64.
    pub fn to_f64(&self) -> Result<Vec<Option<f64>>> {
        Ok(match self {
            Self::Int32(v) => v.iter().map(|v| v.map(|v| v as f64)).collect(),
            Self::Int64(v) => v.iter().map(|v| v.map(|v| v as f64)).collect(),
            Self::Float32(v) => v.iter().map(|v| v.map(|v| v as f64)).collect(),
            Self::Float64(v) => v.clone(),
            other => {
                return Err(LabelError::Type(format!(
                    "Expected numeric array, got {}",
                    other.datatype()
                )));
            }
        })
    }

    /// Integer values promoted to i64.
    pub fn to_i64(&self) -> Result<Vec<Option<i64>>> {
        Ok(match self {
            Self::Int32(v) => v.iter().map(|v| v.map(|v| v as i64)).collect(),
            Self::Int64(v) => v.clone(),
            other => {
                return Err(LabelError::Type(format!(
                    "Expected integer array, got {}",
                    other.datatype()
                )));
            }
        })
    }

    pub fn as_booleans(&self) -> Result<&[Option<bool>]> {
        match self {
            Self::Boolean(v) => Ok(v),
            other => Err(LabelError::Type(format!(
                "Expected boolean array, got {}",
                other.datatype()
            ))),
        }
    }

    pub fn as_utf8(&self) -> Result<&[Option<String>]> {
        match self {
            Self::Utf8(v) => Ok(v),
            other => Err(LabelError::Type(format!(
                "Expected utf8 array, got {}",
                other.datatype()
            ))),
        }
    }

    /// Cast between numeric types. Casting to the same type is a no-op.
    pub fn cast(&self, to: DataType) -> Result<Array> {
        if self.datatype() == to {
            return Ok(self.clone());
        }

        match to {
            DataType::Float64 => Ok(Array::Float64(self.to_f64()?)),
            DataType::Int64 => Ok(Array::Int64(self.to_i64()?)),
            DataType::Float32 if self.datatype().is_numeric() => Ok(Array::Float32(
                self.to_f64()?
                    .into_iter()
                    .map(|v| v.map(|v| v as f32))
                    .collect(),
            )),
            _ => Err(LabelError::Type(format!(
                "Cannot cast {} to {to}",
                self.datatype()
            ))),
        }
    }

    /// Hashable key for the value at `idx`, `None` if null.
    pub fn group_key(&self, idx: usize) -> Option<GroupKey> {
        match self {
            Self::Boolean(v) => v[idx].map(GroupKey::Boolean),
            Self::Int32(v) => v[idx].map(|v| GroupKey::Int(v as i64)),
            Self::Int64(v) => v[idx].map(GroupKey::Int),
            Self::Float32(v) => v[idx].map(|v| GroupKey::from_f64(v as f64)),
            Self::Float64(v) => v[idx].map(GroupKey::from_f64),
            Self::Utf8(v) => v[idx].clone().map(GroupKey::Utf8),
        }
    }

    /// Compare two rows of this array. Nulls sort after all values.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        fn cmp_nulls_last<T>(a: &Option<T>, b: &Option<T>, f: impl Fn(&T, &T) -> Ordering) -> Ordering {
            match (a, b) {
                (Some(a), Some(b)) => f(a, b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }

        match self {
            Self::Boolean(v) => cmp_nulls_last(&v[a], &v[b], Ord::cmp),
            Self::Int32(v) => cmp_nulls_last(&v[a], &v[b], Ord::cmp),
            Self::Int64(v) => cmp_nulls_last(&v[a], &v[b], Ord::cmp),
            Self::Float32(v) => cmp_nulls_last(&v[a], &v[b], |a, b| a.total_cmp(b)),
            Self::Float64(v) => cmp_nulls_last(&v[a], &v[b], |a, b| a.total_cmp(b)),
            Self::Utf8(v) => cmp_nulls_last(&v[a], &v[b], |a, b| a.as_str().cmp(b.as_str())),
        }
    }

    /// Text form of the value at `idx`, `None` if null.
    pub fn format_value(&self, idx: usize) -> Option<String> {
        match self {
            Self::Boolean(v) => v[idx].map(|v| v.to_string()),
            Self::Int32(v) => v[idx].map(|v| v.to_string()),
            Self::Int64(v) => v[idx].map(|v| v.to_string()),
            Self::Float32(v) => v[idx].map(|v| v.to_string()),
            Self::Float64(v) => v[idx].map(|v| v.to_string()),
            Self::Utf8(v) => v[idx].clone(),
        }
    }
}

impl From<Vec<Option<bool>>> for Array {
    fn from(values: Vec<Option<bool>>) -> Self {
        Array::Boolean(values)
    }
}

impl From<Vec<Option<i32>>> for Array {
    fn from(values: Vec<Option<i32>>) -> Self {
        Array::Int32(values)
    }
}

impl From<Vec<Option<i64>>> for Array {
    fn from(values: Vec<Option<i64>>) -> Self {
        Array::Int64(values)
    }
}

impl From<Vec<Option<f64>>> for Array {
    fn from(values: Vec<Option<f64>>) -> Self {
        Array::Float64(values)
    }
}

impl From<Vec<Option<&str>>> for Array {
    fn from(values: Vec<Option<&str>>) -> Self {
        Array::Utf8(values.into_iter().map(|v| v.map(String::from)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_optional_produces_nulls() {
        let arr = Array::from(vec![Some(1_i64), None, Some(3)]);
        let out = arr.take_optional(&[Some(2), None, Some(1), Some(0)]);
        assert_eq!(Array::from(vec![Some(3_i64), None, None, Some(1)]), out);
    }

    #[test]
    fn select_zips() {
        let then = Array::from(vec![Some("a"), Some("b"), Some("c")]);
        let otherwise = Array::from(vec![None, Some("y"), Some("z")]);
        let out = Array::select(&[true, false, false], &then, &otherwise).unwrap();
        assert_eq!(Array::from(vec![Some("a"), Some("y"), Some("z")]), out);
    }

    #[test]
    fn select_type_mismatch() {
        let then = Array::from(vec![Some("a")]);
        let otherwise = Array::from(vec![Some(1_i64)]);
        Array::select(&[true], &then, &otherwise).unwrap_err();
    }

    #[test]
    fn compare_rows_nulls_last() {
        let arr = Array::from(vec![Some(2.0), None, Some(1.0)]);
        assert_eq!(Ordering::Greater, arr.compare_rows(0, 2));
        assert_eq!(Ordering::Less, arr.compare_rows(0, 1));
        assert_eq!(Ordering::Greater, arr.compare_rows(1, 2));
    }

    #[test]
    fn cast_int_to_float() {
        let arr = Array::Int32(vec![Some(4), None]);
        assert_eq!(
            Array::from(vec![Some(4.0), None]),
            arr.cast(DataType::Float64).unwrap()
        );
        Array::from(vec![Some("x")])
            .cast(DataType::Float64)
            .unwrap_err();
    }

    #[test]
    fn push_checks_type() {
        let mut arr = Array::with_capacity(DataType::Int32, 2);
        arr.push(ScalarValue::Int32(1)).unwrap();
        arr.push(ScalarValue::Null).unwrap();
        arr.push(ScalarValue::Utf8("a".to_string())).unwrap_err();
        assert_eq!(Array::Int32(vec![Some(1), None]), arr);
    }
}
