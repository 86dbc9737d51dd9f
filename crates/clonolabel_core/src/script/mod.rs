//! Annotation scripts: the JSON filter language and its column dependencies.

pub mod ast;
pub mod resolver;

use std::path::Path;

use tracing::debug;

use self::ast::AnnotationScript;
use crate::errors::{LabelError, Result};

pub fn parse_script(json: &str) -> Result<AnnotationScript> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_script(path: &Path) -> Result<AnnotationScript> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| LabelError::io(path.display().to_string(), e))?;
    let script = parse_script(&json).map_err(|e| {
        LabelError::Config(format!(
            "Failed to decode annotation script '{}': {e}",
            path.display()
        ))
    })?;
    debug!(path = %path.display(), mode = %script.mode, steps = script.steps.len(), "loaded script");
    Ok(script)
}
