use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Load the trace collection stored under `collection_key`.
///
/// The document must be a JSON object. A missing key yields an empty
/// collection; a key holding anything but an array is an error.
pub fn load_source(path: &Path, collection_key: &str) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source: {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse source JSON: {}", path.display()))?;

    let Value::Object(mut map) = document else {
        bail!(
            "Source {} must be a JSON object with a '{collection_key}' list",
            path.display()
        );
    };

    match map.remove(collection_key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(traces)) => Ok(traces),
        Some(_) => bail!(
            "'{collection_key}' in {} must be a list of traces",
            path.display()
        ),
    }
}

/// Write `{ "<collection_key>": [...] }` as pretty-printed JSON.
pub fn write_source(path: &Path, collection_key: &str, traces: Vec<Value>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut document = Map::new();
    document.insert(collection_key.to_string(), Value::Array(traces));
    let content = serde_json::to_string_pretty(&Value::Object(document))
        .context("Failed to serialize traces")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write source: {}", path.display()))
}
