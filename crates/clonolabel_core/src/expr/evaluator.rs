use super::{ComparisonOperator, ConjunctionOperator, Expression};
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::errors::{LabelError, Result};

/// Evaluate an expression against every row of a batch.
///
/// Expressions are expected to have been type checked against the batch
/// schema.
pub fn evaluate(expr: &Expression, batch: &Batch) -> Result<Array> {
    let num_rows = batch.num_rows();

    match expr {
        Expression::Column(name) => Ok(batch.column(name)?.clone()),
        Expression::Literal(value) => Array::repeat(value, num_rows),
        Expression::TypedNull(datatype) => Ok(Array::new_null(*datatype, num_rows)),
        Expression::Cast { expr, to } => evaluate(expr, batch)?.cast(*to),
        Expression::Comparison { op, left, right } => {
            let left = evaluate(left, batch)?;
            let right = evaluate(right, batch)?;
            eval_comparison(*op, &left, &right)
        }
        Expression::Add { left, right } => {
            let left = evaluate(left, batch)?;
            let right = evaluate(right, batch)?;
            eval_add(&left, &right)
        }
        Expression::Conjunction { op, left, right } => {
            let left = evaluate(left, batch)?;
            let right = evaluate(right, batch)?;
            let out = left
                .as_booleans()?
                .iter()
                .zip(right.as_booleans()?)
                .map(|(&l, &r)| match op {
                    ConjunctionOperator::And => kleene_and(l, r),
                    ConjunctionOperator::Or => kleene_or(l, r),
                })
                .collect();
            Ok(Array::Boolean(out))
        }
        Expression::Not(expr) => {
            let input = evaluate(expr, batch)?;
            let out = input.as_booleans()?.iter().map(|v| v.map(|v| !v)).collect();
            Ok(Array::Boolean(out))
        }
        Expression::IsNull(expr) => {
            let input = evaluate(expr, batch)?;
            Ok(Array::Boolean(
                (0..input.len()).map(|idx| Some(input.is_null(idx))).collect(),
            ))
        }
        Expression::IsNotNull(expr) => {
            let input = evaluate(expr, batch)?;
            Ok(Array::Boolean(
                (0..input.len()).map(|idx| Some(!input.is_null(idx))).collect(),
            ))
        }
        Expression::Contains { expr, pattern } => {
            let input = evaluate(expr, batch)?;
            let out = input
                .as_utf8()?
                .iter()
                .map(|v| v.as_ref().map(|s| s.contains(pattern.as_str())))
                .collect();
            Ok(Array::Boolean(out))
        }
        Expression::Log10(expr) => {
            let input = evaluate(expr, batch)?.to_f64()?;
            let out = input
                .into_iter()
                .map(|v| v.filter(|&v| v > 0.0).map(f64::log10))
                .collect();
            Ok(Array::Float64(out))
        }
        Expression::FillNull { expr, fill } => {
            let input = evaluate(expr, batch)?;
            let fill = evaluate(fill, batch)?;
            let mask: Vec<bool> = (0..input.len()).map(|idx| !input.is_null(idx)).collect();
            Array::select(&mask, &input, &fill)
        }
        Expression::Case {
            when,
            then,
            otherwise,
        } => {
            let when = evaluate(when, batch)?;
            let mask: Vec<bool> = when
                .as_booleans()?
                .iter()
                .map(|v| v.unwrap_or(false))
                .collect();
            let then = evaluate(then, batch)?;
            let otherwise = evaluate(otherwise, batch)?;
            Array::select(&mask, &then, &otherwise)
        }
    }
}

/// Evaluate a predicate, treating null as false.
pub fn evaluate_mask(expr: &Expression, batch: &Batch) -> Result<Vec<bool>> {
    let out = evaluate(expr, batch)?;
    Ok(out
        .as_booleans()?
        .iter()
        .map(|v| v.unwrap_or(false))
        .collect())
}

fn kleene_and(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn kleene_or(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn compare_values<T: PartialOrd + ?Sized>(op: ComparisonOperator, l: &T, r: &T) -> bool {
    match op {
        ComparisonOperator::Eq => l == r,
        ComparisonOperator::LtEq => l <= r,
        ComparisonOperator::Gt => l > r,
        ComparisonOperator::GtEq => l >= r,
    }
}

fn eval_comparison(op: ComparisonOperator, left: &Array, right: &Array) -> Result<Array> {
    let out = match (left, right) {
        (Array::Utf8(l), Array::Utf8(r)) => l
            .iter()
            .zip(r)
            .map(|(l, r)| match (l, r) {
                (Some(l), Some(r)) => Some(compare_values(op, l.as_str(), r.as_str())),
                _ => None,
            })
            .collect(),
        (Array::Boolean(l), Array::Boolean(r)) => l
            .iter()
            .zip(r)
            .map(|(l, r)| match (l, r) {
                (Some(l), Some(r)) => Some(compare_values(op, l, r)),
                _ => None,
            })
            .collect(),
        (l, r) if l.datatype().is_numeric() && r.datatype().is_numeric() => l
            .to_f64()?
            .into_iter()
            .zip(r.to_f64()?)
            .map(|(l, r)| match (l, r) {
                (Some(l), Some(r)) => Some(compare_values(op, &l, &r)),
                _ => None,
            })
            .collect(),
        (l, r) => {
            return Err(LabelError::Type(format!(
                "Cannot compare {} with {}",
                l.datatype(),
                r.datatype()
            )));
        }
    };
    Ok(Array::Boolean(out))
}

fn eval_add(left: &Array, right: &Array) -> Result<Array> {
    if left.datatype().is_integer() && right.datatype().is_integer() {
        let out = left
            .to_i64()?
            .into_iter()
            .zip(right.to_i64()?)
            .map(|(l, r)| match (l, r) {
                (Some(l), Some(r)) => l
                    .checked_add(r)
                    .map(Some)
                    .ok_or_else(|| LabelError::Execution(format!("Overflow adding {l} and {r}"))),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(Array::Int64(out));
    }

    let out = left
        .to_f64()?
        .into_iter()
        .zip(right.to_f64()?)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => Some(l + r),
            _ => None,
        })
        .collect();
    Ok(Array::Float64(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::*;

    fn test_batch() -> Batch {
        Batch::try_from_columns([
            ("name", Array::from(vec![Some("CASSF"), None, Some("CAW")])),
            ("a", Array::from(vec![Some(1.0), Some(2.0), None])),
            ("b", Array::Int32(vec![Some(3), Some(2), Some(1)])),
        ])
        .unwrap()
    }

    #[test]
    fn comparison_with_nulls() {
        let batch = test_batch();
        let out = evaluate(
            &compare(ComparisonOperator::Gt, col("b"), col("a")),
            &batch,
        )
        .unwrap();
        assert_eq!(Array::Boolean(vec![Some(true), Some(false), None]), out);
    }

    #[test]
    fn kleene_logic() {
        assert_eq!(Some(false), kleene_and(None, Some(false)));
        assert_eq!(None, kleene_and(None, Some(true)));
        assert_eq!(Some(true), kleene_or(None, Some(true)));
        assert_eq!(None, kleene_or(None, Some(false)));
    }

    #[test]
    fn contains_propagates_null() {
        let out = evaluate(&contains(col("name"), "ASS"), &test_batch()).unwrap();
        assert_eq!(Array::Boolean(vec![Some(true), None, Some(false)]), out);
    }

    #[test]
    fn log10_non_positive_is_null() {
        let batch = Batch::try_from_columns([(
            "x",
            Array::from(vec![Some(100.0), Some(0.0), Some(-5.0), None]),
        )])
        .unwrap();
        let out = evaluate(&log10(col("x")), &batch).unwrap();
        assert_eq!(Array::from(vec![Some(2.0), None, None, None]), out);
    }

    #[test]
    fn fill_null_and_case() {
        let batch = test_batch();
        let out = evaluate(&fill_null(col("a"), lit(0.0)), &batch).unwrap();
        assert_eq!(Array::from(vec![Some(1.0), Some(2.0), Some(0.0)]), out);

        let expr = case_when(is_null(col("name")), lit("missing"), col("name"));
        let out = evaluate(&expr, &batch).unwrap();
        assert_eq!(
            Array::from(vec![Some("CASSF"), Some("missing"), Some("CAW")]),
            out
        );
    }

    #[test]
    fn integer_add_stays_integer() {
        let out = evaluate(&add(col("b"), lit(1_i64)), &test_batch()).unwrap();
        assert_eq!(Array::Int64(vec![Some(4), Some(3), Some(2)]), out);
    }

    #[test]
    fn mask_treats_null_as_false() {
        let mask = evaluate_mask(
            &compare(ComparisonOperator::GtEq, col("a"), lit(1.0)),
            &test_batch(),
        )
        .unwrap();
        assert_eq!(vec![true, true, false], mask);
    }
}
