//! YAML front matter splitting

use crate::{Error, Result};
use serde_json::{Map, Value};

const DELIMITER: &str = "---";

/// A markdown document split into metadata and body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Front matter as a JSON object, empty when absent
    pub metadata: Value,
    pub body: String,
}

/// Split `content` into front matter and body.
///
/// Only content that starts with `---` has front matter. The header ends at
/// the next `---`; when there is none, the whole text is the body.
pub fn parse(content: &str) -> Result<Document> {
    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Ok(Document {
            metadata: Value::Object(Map::new()),
            body: content.to_string(),
        });
    };

    let Some((header, body)) = rest.split_once(DELIMITER) else {
        return Ok(Document {
            metadata: Value::Object(Map::new()),
            body: content.to_string(),
        });
    };

    Ok(Document {
        metadata: parse_yaml_mapping(header)?,
        body: body.trim().to_string(),
    })
}

/// Parse YAML that must be a mapping (or empty) into a JSON object
pub fn parse_yaml_mapping(text: &str) -> Result<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Object(Map::new())),
        serde_yaml::Value::Mapping(_) => Ok(serde_json::to_value(yaml)?),
        other => Err(Error::Parse(format!(
            "expected a YAML mapping, found {}",
            kind_name(&other)
        ))),
    }
}

/// String value of `key`, empty when missing or not a string
pub fn string_field(metadata: &Value, key: &str) -> String {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

const fn kind_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
