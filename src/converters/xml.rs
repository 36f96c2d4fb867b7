//! XML emitter
//!
//! Rebuilds element/attribute/text structure from a value tree using the
//! same key conventions as the normalizer: attribute-prefixed keys become
//! attributes, the text key becomes element text, every other key becomes a
//! child element and a list repeats its element once per item.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::base::ConverterConfig;
use super::{document_root, Emitter, FormatKind};
use crate::error::{Error, Result};
use crate::values::Value;

/// Serializes a value tree back to indented XML
#[derive(Debug, Clone, Default)]
pub struct XmlEmitter {
    config: ConverterConfig,
}

impl XmlEmitter {
    /// Create an XML emitter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, tag: &str, value: &Value) -> Result<()> {
        if tag.is_empty() {
            return Err(Error::Internal("element key must not be empty".to_string()));
        }

        match value {
            Value::Scalar(text) => {
                if text.is_empty() {
                    write(writer, Event::Empty(BytesStart::new(tag)))
                } else {
                    write(writer, Event::Start(BytesStart::new(tag)))?;
                    write(writer, Event::Text(BytesText::new(text)))?;
                    write(writer, Event::End(BytesEnd::new(tag)))
                }
            }
            Value::Object(map) => {
                let mut start = BytesStart::new(tag);
                let mut text = None;
                let mut children = Vec::new();

                for (key, entry) in map {
                    if key == self.config.text_key() {
                        let s = entry.as_str().ok_or_else(|| {
                            Error::Internal(format!("text of <{}> is not a scalar", tag))
                        })?;
                        text = Some(s);
                    } else if let Some(name) = self.config.attribute_name(key) {
                        let s = entry.as_str().ok_or_else(|| {
                            Error::Internal(format!(
                                "attribute '{}' of <{}> is not a scalar",
                                name, tag
                            ))
                        })?;
                        start.push_attribute((name, s));
                    } else {
                        children.push((key.as_str(), entry));
                    }
                }

                if text.is_none() && children.is_empty() {
                    return write(writer, Event::Empty(start));
                }

                write(writer, Event::Start(start))?;
                if let Some(text) = text {
                    write(writer, Event::Text(BytesText::new(text)))?;
                }
                for (key, entry) in children {
                    match entry {
                        Value::List(items) => {
                            for item in items {
                                if item.is_list() {
                                    return Err(Error::Internal(format!(
                                        "list of <{}> directly contains another list",
                                        key
                                    )));
                                }
                                self.write_element(writer, key, item)?;
                            }
                        }
                        _ => self.write_element(writer, key, entry)?,
                    }
                }
                write(writer, Event::End(BytesEnd::new(tag)))
            }
            Value::List(_) => Err(Error::Internal(format!(
                "<{}> is a list where an element value was expected",
                tag
            ))),
        }
    }
}

impl Emitter for XmlEmitter {
    fn format(&self) -> FormatKind {
        FormatKind::Xml
    }

    fn emit(&self, value: &Value) -> Result<String> {
        let (tag, root) = document_root(value)?;
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', self.config.xml_indent());

        if self.config.xml_declaration() {
            write(
                &mut writer,
                Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            )?;
        }
        self.write_element(&mut writer, tag, root)?;

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Internal(format!("XML output is not UTF-8: {}", e)))?;
        out.push('\n');
        Ok(out)
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Internal(format!("XML serialization failed: {}", e)))
}
