//! JSON emitter

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::base::ConverterConfig;
use super::{Emitter, FormatKind};
use crate::error::{Error, Result};
use crate::values::Value;

/// Serializes a value tree as pretty-printed JSON, keeping entry order
#[derive(Debug, Clone, Default)]
pub struct JsonEmitter {
    config: ConverterConfig,
}

impl JsonEmitter {
    /// Create a JSON emitter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }
}

impl Emitter for JsonEmitter {
    fn format(&self) -> FormatKind {
        FormatKind::Json
    }

    fn emit(&self, value: &Value) -> Result<String> {
        let indent = " ".repeat(self.config.json_indent());
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = Serializer::with_formatter(Vec::new(), formatter);

        value
            .serialize(&mut serializer)
            .map_err(|e| Error::Internal(format!("JSON serialization failed: {}", e)))?;

        String::from_utf8(serializer.into_inner())
            .map_err(|e| Error::Internal(format!("JSON output is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::Normalizer;
    use crate::documents::Document;
    use pretty_assertions::assert_eq;

    fn emit_xml(xml: &str) -> String {
        let doc = Document::from_string(xml).unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());
        JsonEmitter::new().emit(&value).unwrap()
    }

    #[test]
    fn test_simple_document() {
        let json = emit_xml("<root><data>value</data></root>");
        assert_eq!(
            json,
            "{\n    \"root\": {\n        \"data\": \"value\"\n    }\n}"
        );
    }

    #[test]
    fn test_repeated_fields_become_array() {
        let json = emit_xml(
            r#"<template><field name="first">Ada</field><field name="last">Lovelace</field><field name="age">36</field></template>"#,
        );
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let fields = parsed["template"]["field"].as_array().unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["@name"], "first");
        assert_eq!(fields[0]["#text"], "Ada");
        assert_eq!(fields[2]["#text"], "36");
    }

    #[test]
    fn test_key_order_is_preserved() {
        let json = emit_xml("<r><zeta>1</zeta><alpha>2</alpha></r>");
        let zeta = json.find("zeta").unwrap();
        let alpha = json.find("alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_escaping() {
        let json = emit_xml(r#"<r q="say &quot;hi&quot;">a\b</r>"#);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["r"]["@q"], "say \"hi\"");
        assert_eq!(parsed["r"]["#text"], "a\\b");
    }

    #[test]
    fn test_custom_indent() {
        let doc = Document::from_string("<r><a>1</a></r>").unwrap();
        let config = ConverterConfig::new().with_json_indent(2);
        let value = Normalizer::new(&config).normalize_document(doc.root());
        let json = JsonEmitter::with_config(config).emit(&value).unwrap();
        assert!(json.contains("\n  \"r\""));
    }
}
