use std::hash::Hash;

/// Hashable representation of a single non-null value.
///
/// Used for grouping rows in window partitions and for matching join keys.
/// Integers of different widths hash the same so an Int32 key can match an
/// Int64 key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Boolean(bool),
    Int(i64),
    /// Bit pattern of a normalized f64.
    Float(u64),
    Utf8(String),
}

impl GroupKey {
    pub fn from_f64(v: f64) -> Self {
        // -0.0 == 0.0, and all NaNs are the same group.
        let v = if v == 0.0 {
            0.0
        } else if v.is_nan() {
            f64::NAN
        } else {
            v
        };
        GroupKey::Float(v.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_normalization() {
        assert_eq!(GroupKey::from_f64(0.0), GroupKey::from_f64(-0.0));
        assert_eq!(GroupKey::from_f64(f64::NAN), GroupKey::from_f64(-f64::NAN));
        assert_ne!(GroupKey::from_f64(1.0), GroupKey::from_f64(2.0));
    }
}
