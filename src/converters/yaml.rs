//! YAML emitter
//!
//! Every XFA value is a string and must read back as one. `serde_yaml`
//! quotes strings that resolve to something else under the YAML 1.2 core
//! schema, but YAML 1.1 readers also resolve checkbox states (`Off`, `yes`,
//! `y`), sexagesimal times (`12:30`) and dates (`2024-01-15`). Those scalars
//! go through the serializer behind a private-use marker character and are
//! rewritten to single-quoted form afterwards.

use std::borrow::Cow;
use std::cmp::Reverse;

use indexmap::IndexSet;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::{Emitter, FormatKind};
use crate::error::{Error, Result};
use crate::values::Value;

/// Plain scalars a YAML 1.1 reader resolves to a non-string
const YAML11_IMPLICIT_PATTERN: &str = concat!(
    r"^(?:",
    // bool
    r"y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
    // null
    r"|~|null|Null|NULL",
    // int
    r"|[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+",
    r"|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+",
    // float
    r"|[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?",
    r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
    // timestamp
    r"|[0-9]{4}-[0-9]{2}-[0-9]{2}",
    r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]| +)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?: *(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?",
    // value and merge keys
    r"|=|<<",
    r")$"
);

lazy_static::lazy_static! {
    static ref YAML11_IMPLICIT: regex::Regex = regex::Regex::new(YAML11_IMPLICIT_PATTERN).unwrap();
}

/// Check if a plain scalar would not read back as a string
fn needs_quotes(s: &str) -> bool {
    YAML11_IMPLICIT.is_match(s)
}

/// Serializes a value tree as block-style YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlEmitter;

impl YamlEmitter {
    /// Create a YAML emitter
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for YamlEmitter {
    fn format(&self) -> FormatKind {
        FormatKind::Yaml
    }

    fn emit(&self, value: &Value) -> Result<String> {
        let marker = free_marker(value)
            .ok_or_else(|| Error::Internal("no free YAML quoting marker".to_string()))?;

        let mut yaml = serde_yaml::to_string(&Marked { value, marker })
            .map_err(|e| Error::Internal(format!("YAML serialization failed: {}", e)))?;

        let mut quoted: Vec<&str> = implicit_scalars(value).into_iter().collect();
        // Longest first, so a marked `12` is never rewritten as a marked `1`
        quoted.sort_by_key(|s| Reverse(s.len()));
        for s in quoted {
            yaml = yaml.replace(&format!("{}{}", marker, s), &format!("'{}'", s));
        }
        Ok(yaml)
    }
}

/// Value tree view that prefixes implicitly typed scalars with `marker`
struct Marked<'a> {
    value: &'a Value,
    marker: char,
}

impl Marked<'_> {
    fn mark<'s>(&self, s: &'s str) -> Cow<'s, str> {
        if needs_quotes(s) {
            Cow::Owned(format!("{}{}", self.marker, s))
        } else {
            Cow::Borrowed(s)
        }
    }
}

impl Serialize for Marked<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.value {
            Value::Scalar(s) => serializer.serialize_str(&self.mark(s)),
            Value::Object(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    let value = Marked {
                        value,
                        marker: self.marker,
                    };
                    state.serialize_entry(&*self.mark(key), &value)?;
                }
                state.end()
            }
            Value::List(items) => {
                let mut state = serializer.serialize_seq(Some(items.len()))?;
                for value in items {
                    state.serialize_element(&Marked {
                        value,
                        marker: self.marker,
                    })?;
                }
                state.end()
            }
        }
    }
}

/// Visit every key and scalar of a value tree
fn walk<'a>(value: &'a Value, f: &mut impl FnMut(&'a str)) {
    match value {
        Value::Scalar(s) => f(s),
        Value::Object(map) => {
            for (key, entry) in map {
                f(key);
                walk(entry, f);
            }
        }
        Value::List(items) => {
            for item in items {
                walk(item, f);
            }
        }
    }
}

/// Distinct keys and scalars that need quoting
fn implicit_scalars(value: &Value) -> IndexSet<&str> {
    let mut found = IndexSet::new();
    walk(value, &mut |s| {
        if needs_quotes(s) {
            found.insert(s);
        }
    });
    found
}

/// First private-use character that occurs nowhere in the tree
fn free_marker(value: &Value) -> Option<char> {
    let mut used = IndexSet::new();
    walk(value, &mut |s| {
        used.extend(s.chars().filter(|c| ('\u{E000}'..='\u{F8FF}').contains(c)));
    });
    ('\u{E000}'..='\u{F8FF}').find(|c| !used.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{ConverterConfig, Normalizer};
    use crate::documents::Document;
    use pretty_assertions::assert_eq;

    fn emit_xml(xml: &str) -> String {
        let doc = Document::from_string(xml).unwrap();
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(doc.root());
        YamlEmitter::new().emit(&value).unwrap()
    }

    #[test]
    fn test_simple_document() {
        assert_eq!(
            emit_xml("<root><data>value</data></root>"),
            "root:\n  data: value\n"
        );
    }

    #[test]
    fn test_numeric_and_boolean_scalars_stay_strings() {
        let yaml = emit_xml(
            "<r><age>36</age><ok>true</ok><ratio>1.5</ratio><none>null</none>\
             <a>Off</a><b>yes</b><c>On</c><d>y</d><e>N</e><f>12:30</f><g>2024-01-15</g>\
             <h>Open</h></r>",
        );

        assert_eq!(
            yaml,
            "r:\n  age: '36'\n  ok: 'true'\n  ratio: '1.5'\n  none: 'null'\n  \
             a: 'Off'\n  b: 'yes'\n  c: 'On'\n  d: 'y'\n  e: 'N'\n  f: '12:30'\n  \
             g: '2024-01-15'\n  h: Open\n"
        );

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        for key in ["age", "ok", "ratio", "none", "a", "b", "f", "g"] {
            assert!(
                parsed["r"][key].is_string(),
                "{} should read back as a string in:\n{}",
                key,
                yaml
            );
        }
        assert_eq!(parsed["r"]["a"].as_str(), Some("Off"));
    }

    #[test]
    fn test_implicit_keys_are_quoted() {
        assert_eq!(
            emit_xml(r#"<form><on>1</on><field no="x"/></form>"#),
            "form:\n  'on': '1'\n  field:\n    '@no': x\n"
        );
    }

    #[test]
    fn test_prefix_scalars_are_rewritten_separately() {
        assert_eq!(
            emit_xml("<r><a>1</a><b>12</b><c>123</c></r>"),
            "r:\n  a: '1'\n  b: '12'\n  c: '123'\n"
        );
    }

    #[test]
    fn test_marker_avoids_characters_in_data() {
        let yaml = emit_xml("<r><a>\u{E000}x</a><b>no</b></r>");
        assert!(yaml.contains("a: \u{E000}x\n"), "{}", yaml);
        assert!(yaml.contains("b: 'no'\n"), "{}", yaml);
    }

    #[test]
    fn test_needs_quotes() {
        for s in ["Off", "YES", "n", "~", "0x1F", "012", "1_000", "1:20", ".inf", "2001-12-14 21:59:43"] {
            assert!(needs_quotes(s), "{} should need quotes", s);
        }
        for s in ["Open", "offline", "yess", "0o", "1.2.3", "A1", "12:30 pm", ""] {
            assert!(!needs_quotes(s), "{} should stay plain", s);
        }
    }

    #[test]
    fn test_lists_and_markers() {
        let yaml = emit_xml(r#"<t><field name="a">1</field><field name="b">2</field></t>"#);
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let fields = parsed["t"]["field"].as_sequence().unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1]["@name"].as_str(), Some("b"));
        assert_eq!(fields[1]["#text"].as_str(), Some("2"));
    }
}
