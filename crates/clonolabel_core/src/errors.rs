use std::fmt::Write as _;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// Invalid combination of mode, inputs and key columns.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Columns required by the script that no input table provides.
    #[error("{}", describe_missing_columns(.missing, .available, .suggestions))]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<TableColumns>,
        /// (missing column, closest available column)
        suggestions: Vec<(String, String)>,
    },

    #[error("Failed to compile plan: {0}")]
    Compile(String),

    #[error("Type error: {0}")]
    Type(String),

    /// Error raised while building the predicate for a single annotation step.
    ///
    /// Step predicates are type checked when the plan is built, so errors
    /// raised during collect (derived columns, file reads) are never tied to
    /// a step and surface as `Execution` or `Io`.
    #[error("Step {} (label '{}'): {}", .index + 1, .label, .source)]
    Step {
        index: usize,
        label: String,
        #[source]
        source: Box<LabelError>,
    },

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("I/O error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LabelError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        LabelError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach step context to an error produced while compiling a step.
    pub fn in_step(self, index: usize, label: impl Into<String>) -> Self {
        LabelError::Step {
            index,
            label: label.into(),
            source: Box::new(self),
        }
    }
}

/// Columns available on one input table, used for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<String>,
}

fn describe_missing_columns(
    missing: &[String],
    available: &[TableColumns],
    suggestions: &[(String, String)],
) -> String {
    let mut s = format!(
        "Columns required by the script are missing from the input schemas: {}",
        missing.join(", ")
    );
    for table in available {
        let _ = write!(
            s,
            "\n  Available in {}: {}",
            table.table,
            table.columns.join(", ")
        );
    }
    for (missing, similar) in suggestions {
        let _ = write!(s, "\n  Did you mean '{similar}' instead of '{missing}'?");
    }
    s
}

pub type Result<T, E = LabelError> = std::result::Result<T, E>;

macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::LabelError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_is_one_based() {
        let err = LabelError::Type("bad".to_string()).in_step(0, "A");
        assert_eq!("Step 1 (label 'A'): Type error: bad", err.to_string());
    }

    #[test]
    fn missing_columns_lists_tables() {
        let err = LabelError::MissingColumns {
            missing: vec!["cdr3".to_string()],
            available: vec![TableColumns {
                table: "clonotype".to_string(),
                columns: vec!["id".to_string(), "cdr3_aa".to_string()],
            }],
            suggestions: vec![("cdr3".to_string(), "cdr3_aa".to_string())],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing from the input schemas: cdr3"), "{msg}");
        assert!(msg.contains("Available in clonotype: id, cdr3_aa"), "{msg}");
        assert!(msg.contains("Did you mean 'cdr3_aa'"), "{msg}");
    }
}
