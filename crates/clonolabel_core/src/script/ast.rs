use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` the same as a missing flag.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationMode {
    ByClonotype,
    BySampleAndClonotype,
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByClonotype => write!(f, "byClonotype"),
            Self::BySampleAndClonotype => write!(f, "bySampleAndClonotype"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationScript {
    pub mode: AnnotationMode,
    pub steps: Vec<AnnotationStep>,
    pub clonotype_key_column: String,
    /// Required in `bySampleAndClonotype` mode, ignored otherwise.
    #[serde(default)]
    pub sample_key_column: Option<String>,
}

/// A filter and the label assigned to rows matching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStep {
    pub filter: FilterExpression,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FilterExpression {
    /// String match on a column.
    Pattern {
        column: ColumnRef,
        predicate: PatternPredicate,
    },
    /// `rhs > lhs + minDiff`, or `rhs >= lhs + minDiff` when `allowEqual`.
    NumericalComparison {
        lhs: Operand,
        rhs: Operand,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_diff: Option<f64>,
        #[serde(default, deserialize_with = "null_as_false")]
        allow_equal: bool,
    },
    /// Inclusive bounds on a numeric column. Missing bounds are unconstrained.
    NumericalRange {
        column: ColumnRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    #[serde(rename = "isNA")]
    IsNa { column: ColumnRef },
    And { filters: Vec<FilterExpression> },
    Or { filters: Vec<FilterExpression> },
    Not { filter: Box<FilterExpression> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatternPredicate {
    Equals { value: String },
    /// Literal substring match.
    ContainSubsequence { value: String },
}

/// A column named directly, or derived from a source column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Source(String),
    Derived(TransformedColumnSpec),
}

impl ColumnRef {
    /// Name of the column this reference reads from the input tables.
    pub fn source_column(&self) -> &str {
        match self {
            Self::Source(name) => name,
            Self::Derived(spec) => spec.source_column(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Source(value.to_string())
    }
}

impl From<TransformedColumnSpec> for ColumnRef {
    fn from(value: TransformedColumnSpec) -> Self {
        ColumnRef::Derived(value)
    }
}

/// One side of a numerical comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Literal(f64),
    Column(ColumnRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "transformer", rename_all = "camelCase")]
pub enum TransformedColumnSpec {
    /// Ordinal rank, starting at 1 for the smallest value (or largest when
    /// descending).
    Rank {
        column: String,
        #[serde(default, deserialize_with = "null_as_false")]
        descending: bool,
    },
    /// Running sum after sorting by the column.
    SortedCumulativeSum {
        column: String,
        #[serde(default, deserialize_with = "null_as_false")]
        descending: bool,
    },
    Log10 { column: String },
}

impl TransformedColumnSpec {
    pub fn source_column(&self) -> &str {
        match self {
            Self::Rank { column, .. }
            | Self::SortedCumulativeSum { column, .. }
            | Self::Log10 { column } => column,
        }
    }

    /// Stable output column name. Specs with the same canonical name are the
    /// same column.
    pub fn canonical_name(&self) -> String {
        fn direction(descending: bool) -> &'static str {
            if descending { "desc" } else { "asc" }
        }

        match self {
            Self::Rank { column, descending } => {
                format!("{column}_rank_{}", direction(*descending))
            }
            Self::SortedCumulativeSum { column, descending } => {
                format!("{column}_cumsum_{}", direction(*descending))
            }
            Self::Log10 { column } => format!("{column}_log10"),
        }
    }
}

impl fmt::Display for TransformedColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}
