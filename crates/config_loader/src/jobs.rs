//! Job data file loading

use std::path::Path;

use contracts::{ContractError, Job, JsonObject};
use serde_json::Value;
use tracing::debug;

/// Load the request bodies from a JSON array of objects
///
/// Jobs keep their file order; each is tagged with its index.
///
/// # Errors
/// - File read failure
/// - Content is not a JSON array
/// - An element is not a JSON object
pub fn load_jobs(path: &Path) -> Result<Vec<Job>, ContractError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ContractError::input_load(&shown, e.to_string()))?;

    let jobs = parse_jobs(&content).map_err(|message| ContractError::input_load(&shown, message))?;
    debug!(path = %shown, jobs = jobs.len(), "Loaded jobs");
    Ok(jobs)
}

/// Parse a JSON array of objects into jobs
pub fn parse_jobs(content: &str) -> Result<Vec<Job>, String> {
    let items: Vec<Value> =
        serde_json::from_str(content).map_err(|e| format!("expected a JSON array: {e}"))?;

    let payloads = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok::<JsonObject, String>(map),
            other => Err(format!(
                "element {idx} is not an object (got {})",
                kind(&other)
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Job::from_payloads(payloads))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
