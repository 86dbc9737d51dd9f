//! Scalar expressions evaluated column-at-a-time against a batch.

pub mod evaluator;

use std::fmt;

use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;
use crate::arrays::scalar::ScalarValue;
use crate::errors::{LabelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjunctionOperator {
    And,
    Or,
}

impl fmt::Display for ConjunctionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Reference to a column by name.
    Column(String),
    /// A typed constant.
    Literal(ScalarValue),
    /// A null constant of a specific type.
    TypedNull(DataType),
    Cast {
        expr: Box<Expression>,
        to: DataType,
    },
    Comparison {
        op: ComparisonOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Numeric addition.
    Add {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Boolean AND/OR with three-valued logic.
    Conjunction {
        op: ConjunctionOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not(Box<Expression>),
    IsNull(Box<Expression>),
    IsNotNull(Box<Expression>),
    /// Literal substring containment.
    Contains {
        expr: Box<Expression>,
        pattern: String,
    },
    /// Base-10 logarithm, null for non-positive input.
    Log10(Box<Expression>),
    /// Replace nulls in `expr` with values from `fill`.
    FillNull {
        expr: Box<Expression>,
        fill: Box<Expression>,
    },
    Case {
        when: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

pub fn col(name: impl Into<String>) -> Expression {
    Expression::Column(name.into())
}

pub fn lit(value: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(value.into())
}

pub fn typed_null(datatype: DataType) -> Expression {
    Expression::TypedNull(datatype)
}

pub fn cast(expr: Expression, to: DataType) -> Expression {
    Expression::Cast {
        expr: Box::new(expr),
        to,
    }
}

pub fn compare(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn add(left: Expression, right: Expression) -> Expression {
    Expression::Add {
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::Conjunction {
        op: ConjunctionOperator::And,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Conjunction {
        op: ConjunctionOperator::Or,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn not(expr: Expression) -> Expression {
    Expression::Not(Box::new(expr))
}

pub fn is_null(expr: Expression) -> Expression {
    Expression::IsNull(Box::new(expr))
}

pub fn is_not_null(expr: Expression) -> Expression {
    Expression::IsNotNull(Box::new(expr))
}

pub fn contains(expr: Expression, pattern: impl Into<String>) -> Expression {
    Expression::Contains {
        expr: Box::new(expr),
        pattern: pattern.into(),
    }
}

pub fn log10(expr: Expression) -> Expression {
    Expression::Log10(Box::new(expr))
}

pub fn fill_null(expr: Expression, fill: Expression) -> Expression {
    Expression::FillNull {
        expr: Box::new(expr),
        fill: Box::new(fill),
    }
}

pub fn case_when(when: Expression, then: Expression, otherwise: Expression) -> Expression {
    Expression::Case {
        when: Box::new(when),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    }
}

/// An expression producing a named output column.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpression {
    pub name: String,
    pub expr: Expression,
}

impl NamedExpression {
    pub fn new(name: impl Into<String>, expr: Expression) -> Self {
        NamedExpression {
            name: name.into(),
            expr,
        }
    }
}

impl Expression {
    /// Type check the expression against a schema, returning the output type.
    pub fn datatype(&self, schema: &Schema) -> Result<DataType> {
        Ok(match self {
            Self::Column(name) => schema.require(name)?,
            Self::Literal(value) => value.datatype().ok_or_else(|| {
                LabelError::Type("Untyped NULL literal, use a typed null".to_string())
            })?,
            Self::TypedNull(datatype) => *datatype,
            Self::Cast { expr, to } => {
                let from = expr.datatype(schema)?;
                let valid = from == *to || (from.is_numeric() && to.is_numeric());
                if !valid {
                    return Err(LabelError::Type(format!(
                        "Cannot cast {from} to {to} in '{self}'"
                    )));
                }
                *to
            }
            Self::Comparison { left, right, .. } => {
                let l = left.datatype(schema)?;
                let r = right.datatype(schema)?;
                if !(l == r || (l.is_numeric() && r.is_numeric())) {
                    return Err(LabelError::Type(format!(
                        "Cannot compare {l} with {r} in '{self}'"
                    )));
                }
                DataType::Boolean
            }
            Self::Add { left, right } => {
                let l = left.datatype(schema)?;
                let r = right.datatype(schema)?;
                if !(l.is_numeric() && r.is_numeric()) {
                    return Err(LabelError::Type(format!(
                        "Cannot add {l} and {r} in '{self}'"
                    )));
                }
                if l.is_integer() && r.is_integer() {
                    DataType::Int64
                } else {
                    DataType::Float64
                }
            }
            Self::Conjunction { left, right, .. } => {
                expect_type(left, schema, DataType::Boolean)?;
                expect_type(right, schema, DataType::Boolean)?;
                DataType::Boolean
            }
            Self::Not(expr) => {
                expect_type(expr, schema, DataType::Boolean)?;
                DataType::Boolean
            }
            Self::IsNull(expr) | Self::IsNotNull(expr) => {
                expr.datatype(schema)?;
                DataType::Boolean
            }
            Self::Contains { expr, .. } => {
                expect_type(expr, schema, DataType::Utf8)?;
                DataType::Boolean
            }
            Self::Log10(expr) => {
                let datatype = expr.datatype(schema)?;
                if !datatype.is_numeric() {
                    return Err(LabelError::Type(format!(
                        "log10 requires a numeric input, got {datatype} in '{self}'"
                    )));
                }
                DataType::Float64
            }
            Self::FillNull { expr, fill } => {
                let datatype = expr.datatype(schema)?;
                expect_type(fill, schema, datatype)?;
                datatype
            }
            Self::Case {
                when,
                then,
                otherwise,
            } => {
                expect_type(when, schema, DataType::Boolean)?;
                let datatype = then.datatype(schema)?;
                expect_type(otherwise, schema, datatype)?;
                datatype
            }
        })
    }

    /// Names of all columns referenced by this expression.
    pub fn column_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_column_refs(&mut refs);
        refs
    }

    fn collect_column_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::Column(name) => refs.push(name),
            Self::Literal(_) | Self::TypedNull(_) => (),
            Self::Cast { expr, .. }
            | Self::Not(expr)
            | Self::IsNull(expr)
            | Self::IsNotNull(expr)
            | Self::Contains { expr, .. }
            | Self::Log10(expr) => expr.collect_column_refs(refs),
            Self::Comparison { left, right, .. }
            | Self::Add { left, right }
            | Self::Conjunction { left, right, .. } => {
                left.collect_column_refs(refs);
                right.collect_column_refs(refs);
            }
            Self::FillNull { expr, fill } => {
                expr.collect_column_refs(refs);
                fill.collect_column_refs(refs);
            }
            Self::Case {
                when,
                then,
                otherwise,
            } => {
                when.collect_column_refs(refs);
                then.collect_column_refs(refs);
                otherwise.collect_column_refs(refs);
            }
        }
    }
}

fn expect_type(expr: &Expression, schema: &Schema, want: DataType) -> Result<()> {
    let got = expr.datatype(schema)?;
    if got != want {
        return Err(LabelError::Type(format!(
            "Expected {want} for '{expr}', got {got}"
        )));
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => write!(f, "#{name}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::TypedNull(datatype) => write!(f, "NULL::{datatype}"),
            Self::Cast { expr, to } => write!(f, "CAST({expr} AS {to})"),
            Self::Comparison { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Add { left, right } => write!(f, "({left} + {right})"),
            Self::Conjunction { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Not(expr) => write!(f, "NOT {expr}"),
            Self::IsNull(expr) => write!(f, "{expr} IS NULL"),
            Self::IsNotNull(expr) => write!(f, "{expr} IS NOT NULL"),
            Self::Contains { expr, pattern } => write!(f, "contains({expr}, '{pattern}')"),
            Self::Log10(expr) => write!(f, "log10({expr})"),
            Self::FillNull { expr, fill } => write!(f, "fill_null({expr}, {fill})"),
            Self::Case {
                when,
                then,
                otherwise,
            } => write!(f, "CASE WHEN {when} THEN {then} ELSE {otherwise} END"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::field::Field;

    fn schema() -> Schema {
        Schema::try_new([
            Field::new("name", DataType::Utf8),
            Field::new("count", DataType::Int32),
            Field::new("freq", DataType::Float64),
        ])
        .unwrap()
    }

    #[test]
    fn comparison_types() {
        let schema = schema();
        let expr = compare(ComparisonOperator::Gt, col("count"), col("freq"));
        assert_eq!(DataType::Boolean, expr.datatype(&schema).unwrap());

        let expr = compare(ComparisonOperator::Eq, col("name"), col("freq"));
        expr.datatype(&schema).unwrap_err();
    }

    #[test]
    fn add_promotes() {
        let schema = schema();
        assert_eq!(
            DataType::Int64,
            add(col("count"), lit(1_i64)).datatype(&schema).unwrap()
        );
        assert_eq!(
            DataType::Float64,
            add(col("count"), col("freq")).datatype(&schema).unwrap()
        );
    }

    #[test]
    fn missing_column() {
        let err = col("nope").datatype(&schema()).unwrap_err();
        assert!(err.to_string().contains("Missing column 'nope'"), "{err}");
    }

    #[test]
    fn contains_requires_utf8() {
        contains(col("count"), "1").datatype(&schema()).unwrap_err();
        assert_eq!(
            DataType::Boolean,
            contains(col("name"), "CASS").datatype(&schema()).unwrap()
        );
    }

    #[test]
    fn column_refs_walks_tree() {
        let expr = and(
            is_not_null(col("a")),
            compare(ComparisonOperator::Gt, col("b"), add(col("c"), lit(1.0))),
        );
        assert_eq!(vec!["a", "b", "c"], expr.column_refs());
    }

    #[test]
    fn display() {
        let expr = case_when(is_null(col("label")), lit("A"), col("label"));
        assert_eq!(
            "CASE WHEN #label IS NULL THEN 'A' ELSE #label END",
            expr.to_string()
        );
    }
}
