//! Loading OpenAPI documents from disk.
//!
//! Loading sits behind the [`SpecLoader`] trait so the registry can be fed
//! documents from anywhere; [`FileSpecLoader`] reads YAML or JSON files and
//! inlines every local `$ref`.

use crate::document::Document;
use crate::error::SpecLoadError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Source of parsed, dereferenced documents.
#[async_trait]
pub trait SpecLoader: Send + Sync {
    /// Load the document stored at an absolute, canonical path.
    async fn load(&self, path: &Path) -> Result<Document, SpecLoadError>;
}

/// Loads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSpecLoader;

#[async_trait]
impl SpecLoader for FileSpecLoader {
    async fn load(&self, path: &Path) -> Result<Document, SpecLoadError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SpecLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        parse_document(path, &content)
    }
}

/// Parse YAML or JSON text into a dereferenced document.
pub fn parse_document(path: &Path, content: &str) -> Result<Document, SpecLoadError> {
    let parse_err = |message: String| SpecLoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    // YAML is a superset of JSON; going through serde_json::Value turns
    // integer response keys (`200:`) into strings.
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
    let raw = serde_json::to_value(yaml).map_err(|e| parse_err(e.to_string()))?;
    if !raw.is_object() {
        return Err(parse_err("document root is not a mapping".to_string()));
    }

    let mut stack = Vec::new();
    let resolved = dereference(&raw, &raw, &mut stack).map_err(|reference| {
        SpecLoadError::UnresolvedRef {
            path: path.to_path_buf(),
            reference,
        }
    })?;

    serde_json::from_value(resolved).map_err(|e| parse_err(e.to_string()))
}

/// Inline every `$ref` reachable from `value`.
///
/// `stack` holds the references currently being expanded; a reference that
/// points back into it is cut off as an empty schema.
fn dereference(value: &Value, root: &Value, stack: &mut Vec<String>) -> Result<Value, String> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let pointer = reference
                    .strip_prefix('#')
                    .ok_or_else(|| reference.clone())?;
                if stack.contains(reference) {
                    debug!(reference = %reference, "Cutting circular reference");
                    return Ok(Value::Object(serde_json::Map::new()));
                }
                let target = root.pointer(pointer).ok_or_else(|| reference.clone())?;
                stack.push(reference.clone());
                let resolved = dereference(target, root, stack);
                stack.pop();
                return resolved;
            }

            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(key.clone(), dereference(child, root, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| dereference(item, root, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}
