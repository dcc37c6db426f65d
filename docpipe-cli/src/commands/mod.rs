pub mod aggregate;
pub mod find;

pub use aggregate::*;
pub use find::*;

use anyhow::{Context, Result};
use docpipe_core::{documents_from_value, Document, Value};
use std::path::Path;

/// Read a JSON array of documents from a file
pub fn load_collection(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read collection {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("collection {} is not valid JSON", path.display()))?;
    let docs = documents_from_value(Value::from(json))
        .with_context(|| format!("collection {} is not an array of documents", path.display()))?;
    Ok(docs)
}

/// Parse a JSON argument; `@path` reads the JSON from a file
pub fn parse_json_arg(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?,
        None => arg.to_string(),
    };
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("invalid JSON: {}", text))?;
    Ok(Value::from(json))
}

/// Parse a JSON argument that must be a document
pub fn parse_document_arg(name: &str, arg: &str) -> Result<Document> {
    let value = parse_json_arg(arg)?;
    Document::try_from(value).with_context(|| format!("--{} must be a JSON object", name))
}

/// Render documents as a JSON array
pub fn render_documents(docs: &[Document], pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(docs)?
    } else {
        serde_json::to_string(docs)?
    };
    Ok(rendered)
}
