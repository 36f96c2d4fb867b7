//! XFA Converters
//!
//! This module turns a parsed XFA element tree into text in one of the
//! supported output formats. Conversion is two-staged: the [`Normalizer`]
//! folds the element tree into a generic [`Value`] tree, then an [`Emitter`]
//! serializes that tree.
//!
//! Supported formats:
//! - JSON: order-preserving, pretty printed
//! - YAML: block style, every scalar reads back as a string
//! - XML: the inverse of the normalizer
//! - CSV: the value tree flattened into rows of dotted key paths

mod base;
mod csv;
mod json;
mod xml;
mod yaml;

pub use base::{ConverterConfig, Normalizer};
pub use self::csv::CsvEmitter;
pub use json::JsonEmitter;
pub use xml::XmlEmitter;
pub use yaml::YamlEmitter;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::values::Value;

/// Trait for emitters that serialize a value tree to text
pub trait Emitter {
    /// The format this emitter produces
    fn format(&self) -> FormatKind;

    /// Serialize a document-level value tree
    fn emit(&self, value: &Value) -> Result<String>;
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
    /// XML document
    Xml,
    /// Comma-separated values
    Csv,
}

impl FormatKind {
    /// All supported formats
    pub const ALL: [FormatKind; 4] = [
        FormatKind::Json,
        FormatKind::Yaml,
        FormatKind::Xml,
        FormatKind::Csv,
    ];

    /// File extension used for saved output
    pub fn extension(&self) -> &'static str {
        match self {
            FormatKind::Json => "json",
            FormatKind::Yaml => "yaml",
            FormatKind::Xml => "xml",
            FormatKind::Csv => "csv",
        }
    }
}

impl Default for FormatKind {
    fn default() -> Self {
        Self::Json
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FormatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(FormatKind::Json),
            "yaml" | "yml" => Ok(FormatKind::Yaml),
            "xml" => Ok(FormatKind::Xml),
            "csv" => Ok(FormatKind::Csv),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Create an emitter for a format
pub fn create_emitter(kind: FormatKind, config: &ConverterConfig) -> Box<dyn Emitter> {
    match kind {
        FormatKind::Json => Box::new(JsonEmitter::with_config(config.clone())),
        FormatKind::Yaml => Box::new(YamlEmitter::new()),
        FormatKind::Xml => Box::new(XmlEmitter::with_config(config.clone())),
        FormatKind::Csv => Box::new(CsvEmitter::with_config(config.clone())),
    }
}

/// Pull the single root entry out of a document-level value
pub(crate) fn document_root(value: &Value) -> Result<(&str, &Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(tag, inner)| (tag.as_str(), inner))
            .ok_or_else(|| Error::Internal("document value has no root entry".to_string())),
        Value::Object(map) => Err(Error::Internal(format!(
            "document value must have exactly one root entry, found {}",
            map.len()
        ))),
        _ => Err(Error::Internal(
            "document value must be an object with a single root entry".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    #[test]
    fn test_format_kind_parse() {
        assert_eq!("json".parse::<FormatKind>().unwrap(), FormatKind::Json);
        assert_eq!("YAML".parse::<FormatKind>().unwrap(), FormatKind::Yaml);
        assert_eq!("yml".parse::<FormatKind>().unwrap(), FormatKind::Yaml);
        assert_eq!("xml".parse::<FormatKind>().unwrap(), FormatKind::Xml);
        assert_eq!("csv".parse::<FormatKind>().unwrap(), FormatKind::Csv);
    }

    #[test]
    fn test_format_kind_unsupported() {
        let err = "docx".parse::<FormatKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref name) if name == "docx"));
    }

    #[test]
    fn test_format_kind_display() {
        for kind in FormatKind::ALL {
            assert_eq!(kind.to_string().parse::<FormatKind>().unwrap(), kind);
        }
        assert_eq!(FormatKind::default(), FormatKind::Json);
    }

    #[test]
    fn test_create_emitter_matches_kind() {
        let config = ConverterConfig::default();
        for kind in FormatKind::ALL {
            assert_eq!(create_emitter(kind, &config).format(), kind);
        }
    }

    #[test]
    fn test_every_emitter_handles_a_document() {
        let doc = Document::from_string(r#"<form id="1"><field>a</field><field>b</field></form>"#)
            .unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());

        for kind in FormatKind::ALL {
            let out = create_emitter(kind, &config).emit(&value).unwrap();
            assert!(!out.is_empty(), "{} output should not be empty", kind);
        }
    }

    #[test]
    fn test_document_root() {
        let value = Value::Object(
            [("root".to_string(), Value::scalar("x"))].into_iter().collect(),
        );
        let (tag, inner) = document_root(&value).unwrap();
        assert_eq!(tag, "root");
        assert_eq!(inner, &Value::scalar("x"));

        assert!(matches!(
            document_root(&Value::scalar("x")),
            Err(Error::Internal(_))
        ));
    }
}
