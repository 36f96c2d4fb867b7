//! XFA XML tree model
//!
//! This module parses an XFA packet into an owned element tree. Tag and
//! attribute names are kept exactly as written in the packet, namespace
//! prefixes included, and `xmlns` declarations are kept as ordinary
//! attributes so they survive a round trip through the converters.

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Ordered attribute mapping of an element
pub type AttributeMap = IndexMap<String, String>;

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Element name as written in the source (`xfa:data`, `field`)
    pub tag: String,
    /// Element attributes in source order
    pub attributes: AttributeMap,
    /// Text content (if any), trimmed
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Get the element name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get the name with any namespace prefix removed
    pub fn local_name(&self) -> &str {
        match self.tag.split_once(':') {
            Some((_, local)) => local,
            None => &self.tag,
        }
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// Append a text segment; segments of mixed content are joined by a space
    pub fn append_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) if !existing.is_empty() => {
                existing.push(' ');
                existing.push_str(text);
            }
            _ => self.text = Some(text.to_string()),
        }
    }

    /// Builder: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: add a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Find child elements by tag
    pub fn find_children(&self, tag: &str) -> Vec<&Element> {
        self.children.iter().filter(|e| e.tag == tag).collect()
    }

    /// Check if the element has attributes
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Check if the element has child elements
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A parsed XFA packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root element of the packet
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| syntax_error(xml, reader.buffer_position(), e.to_string()))?;

            match event {
                Event::Start(e) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    element_stack.push(element);
                }
                Event::End(_) => {
                    let current = element_stack.pop().ok_or_else(|| {
                        syntax_error(xml, reader.buffer_position(), "Unexpected closing tag")
                    })?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(current);
                    } else {
                        Self::set_root(&mut root, current, xml, reader.buffer_position())?;
                    }
                }
                Event::Empty(e) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        Self::set_root(&mut root, element, xml, reader.buffer_position())?;
                    }
                }
                Event::Text(e) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e.unescape().map_err(|e| {
                            syntax_error(
                                xml,
                                reader.buffer_position(),
                                format!("Failed to unescape text: {}", e),
                            )
                        })?;
                        let text = text.trim();
                        if !text.is_empty() {
                            current.append_text(text);
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        let text = std::str::from_utf8(&raw).map_err(|e| {
                            syntax_error(
                                xml,
                                reader.buffer_position(),
                                format!("Invalid UTF-8 in CDATA section: {}", e),
                            )
                        })?;
                        let text = text.trim();
                        if !text.is_empty() {
                            current.append_text(text);
                        }
                    }
                }
                Event::Eof => break,
                _ => {} // Declarations, comments, processing instructions, doctype
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(syntax_error(
                xml,
                xml.len(),
                format!("Unexpected end of document: <{}> is not closed", open.tag),
            ));
        }

        let root = root.ok_or_else(|| Error::Parse(ParseError::new("Document has no root element")))?;
        Ok(Document { root })
    }

    /// Get the root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Consume the document, returning its root element
    pub fn into_root(self) -> Element {
        self.root
    }

    fn set_root(slot: &mut Option<Element>, element: Element, xml: &[u8], pos: usize) -> Result<()> {
        if slot.is_some() {
            return Err(syntax_error(
                xml,
                pos,
                format!("Unexpected second root element <{}>", element.tag),
            ));
        }
        *slot = Some(element);
        Ok(())
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| ParseError::new(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result.map_err(|e| {
                ParseError::new(format!(
                    "Failed to parse attribute of <{}>: {}",
                    element.tag, e
                ))
            })?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ParseError::new(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| {
                    ParseError::new(format!("Failed to unescape attribute value: {}", e))
                })?
                .to_string();

            element.attributes.insert(attr_name, attr_value);
        }

        limits.check_attributes(element.attributes.len())?;
        Ok(element)
    }
}

fn syntax_error(xml: &[u8], pos: usize, message: impl Into<String>) -> Error {
    let pos = pos.min(xml.len());
    let start = pos.saturating_sub(40);
    let snippet = String::from_utf8_lossy(&xml[start..pos]).into_owned();

    let mut err = ParseError::new(message).with_location(format!("byte {}", pos));
    if !snippet.trim().is_empty() {
        err = err.with_source(snippet);
    }
    Error::Parse(err)
}
