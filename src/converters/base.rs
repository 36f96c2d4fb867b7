//! Base converter types
//!
//! This module provides the converter configuration and the normalizer that
//! folds an XFA element tree into a generic [`Value`] tree.

use indexmap::IndexMap;

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::values::{ObjectMap, Value};

/// Configuration shared by the normalizer and every emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Prefix for attribute names in the value tree
    attr_prefix: String,
    /// Key used for element text in the value tree
    text_key: String,
    /// Indentation for JSON output
    json_indent: usize,
    /// Indentation for XML output
    xml_indent: usize,
    /// Separator between key path segments of CSV column names
    column_separator: String,
    /// Whether XML output starts with an XML declaration
    xml_declaration: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            attr_prefix: "@".to_string(),
            text_key: "#text".to_string(),
            json_indent: 4,
            xml_indent: 2,
            column_separator: ".".to_string(),
            xml_declaration: true,
        }
    }
}

impl ConverterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the attribute prefix
    pub fn attr_prefix(&self) -> &str {
        &self.attr_prefix
    }

    /// Get the text key
    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    /// Get JSON indentation width
    pub fn json_indent(&self) -> usize {
        self.json_indent
    }

    /// Get XML indentation width
    pub fn xml_indent(&self) -> usize {
        self.xml_indent
    }

    /// Get the CSV column separator
    pub fn column_separator(&self) -> &str {
        &self.column_separator
    }

    /// Check if XML output carries a declaration
    pub fn xml_declaration(&self) -> bool {
        self.xml_declaration
    }

    /// Set attribute prefix
    pub fn with_attr_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.attr_prefix = prefix.into();
        self
    }

    /// Set text key
    pub fn with_text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }

    /// Set JSON indentation
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    /// Set XML indentation
    pub fn with_xml_indent(mut self, indent: usize) -> Self {
        self.xml_indent = indent;
        self
    }

    /// Set CSV column separator
    pub fn with_column_separator(mut self, separator: impl Into<String>) -> Self {
        self.column_separator = separator.into();
        self
    }

    /// Set whether XML output starts with a declaration
    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }

    /// Build the value-tree key for an attribute
    pub fn attribute_key(&self, name: &str) -> String {
        format!("{}{}", self.attr_prefix, name)
    }

    /// Return the attribute name if `key` is an attribute key
    pub fn attribute_name<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.attr_prefix.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Check the key markers can never collide with element names.
    ///
    /// Both markers must start with a character that cannot start an XML
    /// name, and the text key must not read as an attribute key.
    pub fn validate(&self) -> Result<()> {
        if self.attr_prefix.is_empty() {
            return Err(Error::Config("attribute prefix must not be empty".to_string()));
        }
        if self.text_key.is_empty() {
            return Err(Error::Config("text key must not be empty".to_string()));
        }
        if starts_like_xml_name(&self.attr_prefix) {
            return Err(Error::Config(format!(
                "attribute prefix '{}' could collide with element names",
                self.attr_prefix
            )));
        }
        if starts_like_xml_name(&self.text_key) {
            return Err(Error::Config(format!(
                "text key '{}' could collide with element names",
                self.text_key
            )));
        }
        if self.text_key.starts_with(self.attr_prefix.as_str()) {
            return Err(Error::Config(format!(
                "text key '{}' starts with the attribute prefix '{}'",
                self.text_key, self.attr_prefix
            )));
        }
        if self.column_separator.is_empty() {
            return Err(Error::Config("column separator must not be empty".to_string()));
        }
        Ok(())
    }
}

fn starts_like_xml_name(s: &str) -> bool {
    s.chars()
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_' || c == ':')
}

/// Folds an element tree into a generic value tree
///
/// The rules, applied recursively:
/// - an element without attributes and children becomes a scalar of its
///   text (empty when absent)
/// - any other element becomes an object holding its attributes, its text
///   (when non-empty) and its children grouped by tag
/// - a tag occurring once maps to the child's value, a tag occurring two or
///   more times maps to a list of the children's values in document order
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    config: &'a ConverterConfig,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer using the given key conventions
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Normalize a whole document: `{ <root-tag>: normalize(root) }`
    pub fn normalize_document(&self, root: &Element) -> Value {
        let mut wrapper = ObjectMap::with_capacity(1);
        wrapper.insert(root.tag.clone(), self.normalize(root));
        Value::Object(wrapper)
    }

    /// Normalize a single element
    pub fn normalize(&self, element: &Element) -> Value {
        if element.children.is_empty() && element.attributes.is_empty() {
            return Value::Scalar(element.text.clone().unwrap_or_default());
        }

        let mut result = ObjectMap::new();

        for (name, value) in &element.attributes {
            result.insert(self.config.attribute_key(name), Value::Scalar(value.clone()));
        }

        if let Some(text) = element.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                result.insert(self.config.text_key().to_string(), Value::Scalar(text.to_string()));
            }
        }

        let mut groups: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for child in &element.children {
            groups
                .entry(child.tag.as_str())
                .or_default()
                .push(self.normalize(child));
        }

        for (tag, mut values) in groups {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::List(values)
            };
            result.insert(tag.to_string(), value);
        }

        Value::Object(result)
    }
}
