//! First-run state used when neither storage tier holds anything usable.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::OrchestratorError;

/// The built-in first-run document.
pub fn default_first_time_state() -> Value {
    json!({ "config": {} })
}

/// The built-in document with the top-level keys of `override_path` (a JSON
/// object) merged over it.
pub fn load_first_time_state(override_path: Option<&Path>) -> Result<Value, OrchestratorError> {
    let base = default_first_time_state();
    let Some(path) = override_path else {
        return Ok(base);
    };
    let raw = std::fs::read_to_string(path)?;
    let overrides: Value = serde_json::from_str(&raw).map_err(|e| {
        OrchestratorError::Config(format!("first-time state {}: {e}", path.display()))
    })?;
    merge_shallow(base, overrides)
}

fn merge_shallow(base: Value, overrides: Value) -> Result<Value, OrchestratorError> {
    let Value::Object(overrides) = overrides else {
        return Err(OrchestratorError::Config(
            "first-time state override must be a JSON object".into(),
        ));
    };
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(overrides);
    Ok(Value::Object(merged))
}
