use std::collections::HashMap;
use std::sync::LazyLock;

use crate::errors::{LabelError, Result};
use crate::storage::tsv::{DEFAULT_NULL_TOKEN, TsvOptions};

pub const DEFAULT_LABEL_COLUMN: &str = "label";

/// Configuration for an annotation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateConfig {
    /// Token for missing string values in input and output files.
    pub null_token: String,
    /// Field delimiter for input and output files.
    pub delimiter: u8,
    /// Name of the output column holding the assigned label.
    pub label_column: String,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        AnnotateConfig {
            null_token: DEFAULT_NULL_TOKEN.to_string(),
            delimiter: b'\t',
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }
}

impl AnnotateConfig {
    pub fn tsv_options(&self) -> TsvOptions {
        TsvOptions {
            delimiter: self.delimiter,
            null_token: self.null_token.clone(),
        }
    }

    /// Set a value by name, e.g. from a `name=value` command line override.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let func = lookup(name)?;
        (func.set)(value, self)
    }

    /// Parse and apply a `name=value` pair.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            LabelError::Config(format!("Expected setting as 'name=value', got '{pair}'"))
        })?;
        self.set(name.trim(), value)
    }

    /// All settings with their current value and description, sorted by name.
    pub fn describe(&self) -> Vec<(&'static str, String, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, func)| (*name, (func.get)(self), func.description))
            .collect();
        settings.sort_by_key(|(name, _, _)| *name);
        settings
    }
}

fn lookup(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS.get(name).ok_or_else(|| {
        let mut names: Vec<_> = GET_SET_FUNCTIONS.keys().copied().collect();
        names.sort_unstable();
        LabelError::Config(format!(
            "Unknown setting '{name}', expected one of: {}",
            names.join(", ")
        ))
    })
}

struct SettingFunctions {
    set: fn(value: &str, conf: &mut AnnotateConfig) -> Result<()>,
    get: fn(conf: &AnnotateConfig) -> String,
    description: &'static str,
}

impl SettingFunctions {
    const fn new<S: AnnotateSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_str as _,
            get: S::get_as_string as _,
            description: S::DESCRIPTION,
        }
    }
}

fn insert_setting<S: AnnotateSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<NullToken>(&mut map);
    insert_setting::<Delimiter>(&mut map);
    insert_setting::<LabelColumn>(&mut map);

    map
});

pub trait AnnotateSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_str(value: &str, conf: &mut AnnotateConfig) -> Result<()>;
    fn get_as_string(conf: &AnnotateConfig) -> String;
}

pub struct NullToken;

impl AnnotateSetting for NullToken {
    const NAME: &'static str = "null_token";
    const DESCRIPTION: &'static str = "Token for missing string values in data files";

    fn set_from_str(value: &str, conf: &mut AnnotateConfig) -> Result<()> {
        if value.is_empty() {
            return Err(LabelError::Config(
                "Null token cannot be empty, empty fields already mean missing numbers"
                    .to_string(),
            ));
        }
        conf.null_token = value.to_string();
        Ok(())
    }

    fn get_as_string(conf: &AnnotateConfig) -> String {
        conf.null_token.clone()
    }
}

pub struct Delimiter;

impl AnnotateSetting for Delimiter {
    const NAME: &'static str = "delimiter";
    const DESCRIPTION: &'static str = "Single byte field delimiter, '\\t' for tab";

    fn set_from_str(value: &str, conf: &mut AnnotateConfig) -> Result<()> {
        let delimiter = match value {
            "\\t" | "tab" => b'\t',
            s if s.len() == 1 => s.as_bytes()[0],
            s => {
                return Err(LabelError::Config(format!(
                    "Delimiter must be a single byte, got '{s}'"
                )));
            }
        };
        conf.delimiter = delimiter;
        Ok(())
    }

    fn get_as_string(conf: &AnnotateConfig) -> String {
        match conf.delimiter {
            b'\t' => "\\t".to_string(),
            b => (b as char).to_string(),
        }
    }
}

pub struct LabelColumn;

impl AnnotateSetting for LabelColumn {
    const NAME: &'static str = "label_column";
    const DESCRIPTION: &'static str = "Name of the output column holding the label";

    fn set_from_str(value: &str, conf: &mut AnnotateConfig) -> Result<()> {
        if value.trim().is_empty() {
            return Err(LabelError::Config(
                "Label column name cannot be empty".to_string(),
            ));
        }
        conf.label_column = value.to_string();
        Ok(())
    }

    fn get_as_string(conf: &AnnotateConfig) -> String {
        conf.label_column.clone()
    }
}
