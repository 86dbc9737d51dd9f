use hashbrown::HashMap;

use crate::arrays::batch::Batch;
use crate::arrays::key::GroupKey;
use crate::errors::{Result, internal};
use crate::logical::logical_join::JoinType;

/// Hash join with the right side as the build side.
pub fn hash_join(left: &Batch, right: &Batch, on: &str, join_type: JoinType) -> Result<Batch> {
    let left_key = left.column(on)?;
    let right_key = right.column(on)?;

    let mut build: HashMap<GroupKey, usize> = HashMap::with_capacity(right.num_rows());
    for row in 0..right.num_rows() {
        if let Some(key) = right_key.group_key(row) {
            build.entry(key).or_insert(row);
        }
    }

    let matches: Vec<Option<usize>> = (0..left.num_rows())
        .map(|row| {
            left_key
                .group_key(row)
                .and_then(|key| build.get(&key).copied())
        })
        .collect();

    let mut out = match join_type {
        JoinType::Left => left.clone(),
    };

    for (field, array) in right.schema().fields().zip(right.arrays()) {
        if field.name == on {
            continue;
        }
        if out.schema().contains(&field.name) {
            return Err(internal!(
                "Join output already contains column '{}'",
                field.name
            ));
        }
        out = out.with_column(&field.name, array.take_optional(&matches))?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;

    fn sample() -> Batch {
        Batch::try_from_columns([
            ("sample", Array::from(vec![Some("s1"), Some("s1"), Some("s2"), Some("s2")])),
            ("id", Array::from(vec![Some("c1"), Some("c9"), Some("c1"), None])),
        ])
        .unwrap()
    }

    fn clonotype() -> Batch {
        Batch::try_from_columns([
            ("id", Array::from(vec![Some("c1"), Some("c2"), Some("c1")])),
            ("cdr3", Array::from(vec![Some("CASS"), Some("CAW"), Some("DUP")])),
        ])
        .unwrap()
    }

    #[test]
    fn left_join_keeps_all_rows() {
        let out = hash_join(&sample(), &clonotype(), "id", JoinType::Left).unwrap();
        assert_eq!(4, out.num_rows());
        assert_eq!(
            &Array::from(vec![Some("CASS"), None, Some("CASS"), None]),
            out.column("cdr3").unwrap()
        );
        assert_eq!(sample().column("sample").unwrap(), out.column("sample").unwrap());
    }

    #[test]
    fn empty_left() {
        let left = sample().filter(&[false; 4]).unwrap();
        let out = hash_join(&left, &clonotype(), "id", JoinType::Left).unwrap();
        assert_eq!(0, out.num_rows());
        assert_eq!(3, out.arrays().len());
    }
}
