use super::transform::DerivedColumns;
use crate::arrays::datatype::DataType;
use crate::arrays::field::Schema;
use crate::errors::{LabelError, Result};
use crate::expr::{
    ComparisonOperator, Expression, add, and, cast, col, compare, contains, fill_null, is_not_null,
    is_null, lit, not, or,
};
use crate::script::ast::{ColumnRef, FilterExpression, Operand, PatternPredicate};

/// Compile a filter into a boolean expression over `schema`.
///
/// Every leaf coerces null to false, so the compiled expression never
/// produces null and `not` behaves as plain negation.
pub fn compile_filter(
    filter: &FilterExpression,
    derived: &DerivedColumns,
    schema: &Schema,
) -> Result<Expression> {
    let compiler = FilterCompiler { derived, schema };
    compiler.compile(filter)
}

struct FilterCompiler<'a> {
    derived: &'a DerivedColumns,
    schema: &'a Schema,
}

impl FilterCompiler<'_> {
    fn compile(&self, filter: &FilterExpression) -> Result<Expression> {
        Ok(match filter {
            FilterExpression::Pattern { column, predicate } => {
                let (name, datatype) = self.resolve(column)?;
                if datatype != DataType::Utf8 {
                    return Err(LabelError::Type(format!(
                        "Pattern filter requires a string column, '{name}' has type {datatype}"
                    )));
                }
                let matched = match predicate {
                    PatternPredicate::Equals { value } => {
                        compare(ComparisonOperator::Eq, col(&name), lit(value.as_str()))
                    }
                    PatternPredicate::ContainSubsequence { value } => {
                        contains(col(&name), value.as_str())
                    }
                };
                null_as_false(matched)
            }
            FilterExpression::NumericalComparison {
                lhs,
                rhs,
                min_diff,
                allow_equal,
            } => {
                let lhs = self.operand(lhs)?;
                let rhs = self.operand(rhs)?;
                let op = if *allow_equal {
                    ComparisonOperator::GtEq
                } else {
                    ComparisonOperator::Gt
                };
                let threshold = add(lhs, lit(min_diff.unwrap_or(0.0)));
                null_as_false(compare(op, rhs, threshold))
            }
            FilterExpression::NumericalRange { column, min, max } => {
                let name = self.numeric_column(column)?;
                let mut expr = is_not_null(col(&name));
                if let Some(min) = min {
                    expr = and(expr, compare(ComparisonOperator::GtEq, col(&name), lit(*min)));
                }
                if let Some(max) = max {
                    expr = and(expr, compare(ComparisonOperator::LtEq, col(&name), lit(*max)));
                }
                expr
            }
            FilterExpression::IsNa { column } => {
                let (name, _) = self.resolve(column)?;
                is_null(col(name))
            }
            FilterExpression::And { filters } => self.fold(filters, true, and)?,
            FilterExpression::Or { filters } => self.fold(filters, false, or)?,
            FilterExpression::Not { filter } => not(self.compile(filter)?),
        })
    }

    /// Left fold of a combinator. An empty list produces `identity`.
    fn fold(
        &self,
        filters: &[FilterExpression],
        identity: bool,
        combine: fn(Expression, Expression) -> Expression,
    ) -> Result<Expression> {
        let mut iter = filters.iter();
        let Some(first) = iter.next() else {
            return Ok(lit(identity));
        };
        let mut expr = self.compile(first)?;
        for filter in iter {
            expr = combine(expr, self.compile(filter)?);
        }
        Ok(expr)
    }

    fn resolve(&self, column: &ColumnRef) -> Result<(String, DataType)> {
        let name = self.derived.resolve(column)?;
        let datatype = self.schema.require(&name)?;
        Ok((name, datatype))
    }

    fn numeric_column(&self, column: &ColumnRef) -> Result<String> {
        let (name, datatype) = self.resolve(column)?;
        if !datatype.is_numeric() {
            return Err(LabelError::Type(format!(
                "Numerical filter requires a numeric column, '{name}' has type {datatype}"
            )));
        }
        Ok(name)
    }

    /// Operands are promoted to Float64.
    fn operand(&self, operand: &Operand) -> Result<Expression> {
        Ok(match operand {
            Operand::Literal(v) => lit(*v),
            Operand::Column(column) => cast(col(self.numeric_column(column)?), DataType::Float64),
        })
    }
}

fn null_as_false(expr: Expression) -> Expression {
    fill_null(expr, lit(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::batch::Batch;
    use crate::expr::evaluator::evaluate;

    fn batch() -> Batch {
        Batch::try_from_columns([
            ("cdr3", Array::from(vec![Some("CASSLG"), None, Some("CAWS")])),
            ("a", Array::from(vec![Some(1.0), Some(2.0), None])),
            ("b", Array::Int32(vec![Some(3), Some(2), Some(5)])),
        ])
        .unwrap()
    }

    fn eval(json: &str) -> Result<Array> {
        let batch = batch();
        let filter: FilterExpression = serde_json::from_str(json).unwrap();
        let expr = compile_filter(&filter, &DerivedColumns::new(), batch.schema())?;
        assert_eq!(DataType::Boolean, expr.datatype(batch.schema()).unwrap());
        evaluate(&expr, &batch)
    }

    fn bools(values: [bool; 3]) -> Array {
        Array::Boolean(values.into_iter().map(Some).collect())
    }

    #[test]
    fn pattern_null_is_false() {
        let out = eval(
            r#"{"type": "pattern", "column": "cdr3", "predicate": {"type": "containSubsequence", "value": "ASS"}}"#,
        )
        .unwrap();
        assert_eq!(bools([true, false, false]), out);

        let out = eval(
            r#"{"type": "pattern", "column": "cdr3", "predicate": {"type": "equals", "value": "CAWS"}}"#,
        )
        .unwrap();
        assert_eq!(bools([false, false, true]), out);
    }

    #[test]
    fn not_is_na() {
        let out = eval(r#"{"type": "not", "filter": {"type": "isNA", "column": "cdr3"}}"#).unwrap();
        assert_eq!(bools([true, false, true]), out);
    }

    #[test]
    fn not_of_null_leaf_is_true() {
        // Comparison against a null value is false, so its negation is true.
        let out = eval(
            r#"{"type": "not", "filter": {"type": "numericalComparison", "lhs": "a", "rhs": 10}}"#,
        )
        .unwrap();
        assert_eq!(bools([false, false, true]), out);
    }

    #[test]
    fn empty_combinators() {
        assert_eq!(bools([true; 3]), eval(r#"{"type": "and", "filters": []}"#).unwrap());
        assert_eq!(bools([false; 3]), eval(r#"{"type": "or", "filters": []}"#).unwrap());
    }

    #[test]
    fn numerical_comparison_formula() {
        // b > a + 1
        let out = eval(
            r#"{"type": "numericalComparison", "lhs": "a", "rhs": "b", "minDiff": 1}"#,
        )
        .unwrap();
        assert_eq!(bools([true, false, false]), out);

        // b >= a + 0
        let out = eval(
            r#"{"type": "numericalComparison", "lhs": "a", "rhs": "b", "allowEqual": true}"#,
        )
        .unwrap();
        assert_eq!(bools([true, true, false]), out);
    }

    #[test]
    fn numerical_range_inclusive() {
        let out = eval(r#"{"type": "numericalRange", "column": "b", "min": 2, "max": 3}"#).unwrap();
        assert_eq!(bools([true, true, false]), out);

        let out = eval(r#"{"type": "numericalRange", "column": "a"}"#).unwrap();
        assert_eq!(bools([true, true, false]), out);
    }

    #[test]
    fn type_mismatches() {
        let err = eval(
            r#"{"type": "pattern", "column": "b", "predicate": {"type": "equals", "value": "3"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LabelError::Type(_)), "{err}");

        let err = eval(r#"{"type": "numericalComparison", "lhs": "cdr3", "rhs": 1}"#).unwrap_err();
        assert!(matches!(err, LabelError::Type(_)), "{err}");
    }

    #[test]
    fn missing_column() {
        eval(r#"{"type": "isNA", "column": "nope"}"#).unwrap_err();
    }
}
