use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::key::GroupKey;
use crate::errors::{LabelError, Result, internal};
use crate::logical::logical_window::{WindowExpr, WindowFunction};

/// Compute a single window expression over a batch.
///
/// Rows are partitioned on the partition column (rows with a null partition
/// key form their own partition), then ordered by the sort keys. Remaining
/// ties are broken by row position so the result is deterministic.
pub fn evaluate_window(batch: &Batch, window: &WindowExpr) -> Result<Array> {
    let num_rows = batch.num_rows();

    let sort_columns = window
        .order_by
        .iter()
        .map(|sort| Ok((batch.column(&sort.column)?, sort.descending)))
        .collect::<Result<Vec<_>>>()?;
    let (leading, _) = sort_columns
        .first()
        .ok_or_else(|| internal!("Window '{}' missing ORDER BY", window.alias))?;

    let summed = match &window.function {
        WindowFunction::RowNumber => None,
        WindowFunction::CumulativeSum { column } => Some(batch.column(column)?),
    };
    let partition = match &window.partition_by {
        Some(column) => Some(batch.column(column)?),
        None => None,
    };

    let mut partitions: HashMap<Option<GroupKey>, Vec<usize>> = HashMap::new();
    for row in 0..num_rows {
        if leading.is_null(row) || summed.is_some_and(|arr| arr.is_null(row)) {
            continue;
        }
        let key = partition.and_then(|arr| arr.group_key(row));
        partitions.entry(key).or_default().push(row);
    }

    let compare = |a: &usize, b: &usize| -> Ordering {
        for (array, descending) in &sort_columns {
            let ord = array.compare_rows(*a, *b);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.cmp(b)
    };
    for rows in partitions.values_mut() {
        rows.sort_by(compare);
    }

    match summed {
        None => {
            let mut out = vec![None; num_rows];
            for rows in partitions.values() {
                for (pos, &row) in rows.iter().enumerate() {
                    out[row] = Some(pos as i64 + 1);
                }
            }
            Ok(Array::Int64(out))
        }
        Some(values) if values.datatype().is_integer() => {
            let values = values.to_i64()?;
            let mut out = vec![None; num_rows];
            for rows in partitions.values() {
                let mut total: i64 = 0;
                for &row in rows {
                    // Rows with null values were excluded above.
                    let value = values[row].unwrap_or(0);
                    total = total.checked_add(value).ok_or_else(|| {
                        LabelError::Execution(format!(
                            "Overflow computing cumulative sum for '{}'",
                            window.alias
                        ))
                    })?;
                    out[row] = Some(total);
                }
            }
            Ok(Array::Int64(out))
        }
        Some(values) => {
            let values = values.to_f64()?;
            let mut out = vec![None; num_rows];
            for rows in partitions.values() {
                let mut total = 0.0;
                for &row in rows {
                    total += values[row].unwrap_or(0.0);
                    out[row] = Some(total);
                }
            }
            Ok(Array::Float64(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::logical_window::SortExpr;

    fn rank(column: &str, descending: bool, partition_by: Option<&str>) -> WindowExpr {
        WindowExpr {
            function: WindowFunction::RowNumber,
            partition_by: partition_by.map(String::from),
            order_by: vec![
                SortExpr::new(column, descending),
                SortExpr::new("id", false),
            ],
            alias: "out".to_string(),
        }
    }

    fn cumsum(column: &str, descending: bool) -> WindowExpr {
        WindowExpr {
            function: WindowFunction::CumulativeSum {
                column: column.to_string(),
            },
            ..rank(column, descending, None)
        }
    }

    #[test]
    fn rank_ties_broken_by_key() {
        let batch = Batch::try_from_columns([
            (
                "id",
                Array::from(vec![Some("r1"), Some("r2"), Some("r3"), Some("r4")]),
            ),
            ("v", Array::from(vec![Some(5_i64), Some(3), Some(3), Some(1)])),
        ])
        .unwrap();

        let out = evaluate_window(&batch, &rank("v", false, None)).unwrap();
        assert_eq!(Array::Int64(vec![Some(4), Some(2), Some(3), Some(1)]), out);

        // Tie key stays ascending when the value is ranked descending.
        let out = evaluate_window(&batch, &rank("v", true, None)).unwrap();
        assert_eq!(Array::Int64(vec![Some(1), Some(2), Some(3), Some(4)]), out);
    }

    #[test]
    fn rank_tie_key_not_row_order() {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("b"), Some("a")])),
            ("v", Array::from(vec![Some(1.0), Some(1.0)])),
        ])
        .unwrap();
        let out = evaluate_window(&batch, &rank("v", false, None)).unwrap();
        assert_eq!(Array::Int64(vec![Some(2), Some(1)]), out);
    }

    #[test]
    fn rank_nulls_do_not_consume_positions() {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("a"), Some("b"), Some("c")])),
            ("v", Array::from(vec![Some(2.0), None, Some(1.0)])),
        ])
        .unwrap();
        let out = evaluate_window(&batch, &rank("v", false, None)).unwrap();
        assert_eq!(Array::Int64(vec![Some(2), None, Some(1)]), out);
    }

    #[test]
    fn rank_partitioned() {
        let batch = Batch::try_from_columns([
            ("s", Array::from(vec![Some("x"), Some("y"), Some("x"), Some("y")])),
            ("id", Array::from(vec![Some("a"), Some("a"), Some("b"), Some("b")])),
            ("v", Array::from(vec![Some(1_i64), Some(5), Some(2), Some(4)])),
        ])
        .unwrap();
        let out = evaluate_window(&batch, &rank("v", true, Some("s"))).unwrap();
        assert_eq!(Array::Int64(vec![Some(2), Some(1), Some(1), Some(2)]), out);
    }

    #[test]
    fn cumsum_reassociates_rows() {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("a"), Some("b"), Some("c")])),
            ("v", Array::from(vec![Some(3_i64), Some(1), Some(2)])),
        ])
        .unwrap();
        let out = evaluate_window(&batch, &cumsum("v", false)).unwrap();
        assert_eq!(Array::Int64(vec![Some(6), Some(1), Some(3)]), out);

        let out = evaluate_window(&batch, &cumsum("v", true)).unwrap();
        assert_eq!(Array::Int64(vec![Some(3), Some(6), Some(5)]), out);
    }

    #[test]
    fn cumsum_float_skips_nulls() {
        let batch = Batch::try_from_columns([
            ("id", Array::from(vec![Some("a"), Some("b"), Some("c")])),
            ("v", Array::from(vec![Some(0.5), None, Some(0.25)])),
        ])
        .unwrap();
        let out = evaluate_window(&batch, &cumsum("v", false)).unwrap();
        assert_eq!(Array::Float64(vec![Some(0.75), None, Some(0.25)]), out);
    }
}
