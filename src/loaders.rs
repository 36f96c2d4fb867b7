//! XFA packet loading
//!
//! This module locates the XFA packet of a PDF document. XFA lives under
//! `/Root /AcroForm /XFA` and is stored either as a single stream holding
//! the complete XDP document, or as an array of alternating `name, stream`
//! pairs (`preamble`, `config`, `template`, `datasets`, ..., `postamble`).

use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

/// Source of raw XFA XML for a PDF path
///
/// Returns `Ok(None)` when the document carries no XFA packet.
pub trait XfaSource {
    /// Extract the XFA bytes of the document at `path`
    fn xfa_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// Which part of the XFA data to extract
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Packet {
    /// The complete XDP document
    #[default]
    Full,
    /// The `datasets` packet (form data)
    Datasets,
    /// The `template` packet (form layout and fields)
    Template,
    /// Any packet by name
    Named(String),
}

impl Packet {
    /// Parse a packet selection from a name
    pub fn from_name(name: &str) -> Self {
        match name {
            "full" | "xdp" => Packet::Full,
            "datasets" => Packet::Datasets,
            "template" => Packet::Template,
            other => Packet::Named(other.to_string()),
        }
    }

    /// Packet name in the XFA array, `None` for the complete document
    pub fn name(&self) -> Option<&str> {
        match self {
            Packet::Full => None,
            Packet::Datasets => Some("datasets"),
            Packet::Template => Some("template"),
            Packet::Named(name) => Some(name),
        }
    }
}

/// A named, decoded XFA packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfaPacket {
    /// Packet name (`xdp` for a single-stream XFA entry)
    pub name: String,
    /// Decoded packet bytes
    pub data: Vec<u8>,
}

/// XFA extractor backed by `lopdf`
#[derive(Debug, Clone, Default)]
pub struct PdfLoader {
    /// Password for encrypted documents
    password: Option<String>,
    /// Packet to extract
    packet: Packet,
}

impl PdfLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password used to decrypt encrypted documents
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the packet to extract
    pub fn with_packet(mut self, packet: Packet) -> Self {
        self.packet = packet;
        self
    }

    /// Get the packet selection
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Load and decrypt a PDF from a path
    pub fn open(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| {
            Error::Extraction(format!("Failed to read PDF '{}': {}", path.display(), e))
        })?;
        self.open_bytes(&bytes)
    }

    /// Load and decrypt a PDF from memory
    pub fn open_bytes(&self, bytes: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| Error::Extraction(format!("Failed to parse PDF: {}", e)))?;

        if doc.is_encrypted() {
            unlock(self.password.as_deref(), |password| doc.decrypt(password))?;
        }

        Ok(doc)
    }

    /// List every XFA packet of a document, in document order
    pub fn packets(&self, doc: &Document) -> Result<Vec<XfaPacket>> {
        let xfa = match xfa_entry(doc)? {
            Some(obj) => obj,
            None => return Ok(Vec::new()),
        };

        match xfa {
            Object::Stream(stream) => Ok(vec![XfaPacket {
                name: "xdp".to_string(),
                data: decode_stream(stream)?,
            }]),
            Object::Array(items) => {
                let mut packets = Vec::with_capacity(items.len() / 2);
                for pair in items.chunks(2) {
                    let [name, stream] = pair else {
                        debug!("ignoring trailing unpaired XFA array entry");
                        continue;
                    };
                    let name = packet_name(resolve(doc, name)?)?;
                    let stream = match resolve(doc, stream)? {
                        Object::Stream(stream) => stream,
                        _ => {
                            return Err(Error::Extraction(format!(
                                "XFA packet '{}' is not a stream",
                                name
                            )))
                        }
                    };
                    packets.push(XfaPacket {
                        name,
                        data: decode_stream(stream)?,
                    });
                }
                Ok(packets)
            }
            _ => Err(Error::Extraction(
                "XFA entry is neither stream nor array".to_string(),
            )),
        }
    }

    /// Extract the selected packet from a loaded document
    pub fn extract(&self, doc: &Document) -> Result<Option<Vec<u8>>> {
        let packets = self.packets(doc)?;
        if packets.is_empty() {
            debug!("document has no XFA entry");
            return Ok(None);
        }

        let single_stream = packets.len() == 1 && packets[0].name == "xdp";
        let wanted = match self.packet.name() {
            Some(name) if !single_stream => name,
            Some(_) => {
                debug!("XFA is a single stream; using the complete XDP document");
                return Ok(packets.into_iter().next().map(|p| p.data));
            }
            None => {
                debug!("concatenating {} XFA packet(s)", packets.len());
                return Ok(Some(packets.into_iter().flat_map(|p| p.data).collect()));
            }
        };

        if let Some(packet) = packets.iter().find(|p| p.name == wanted) {
            debug!("using XFA packet '{}' ({} bytes)", packet.name, packet.data.len());
            return Ok(Some(packet.data.clone()));
        }

        if self.packet == Packet::Datasets {
            let fallback = packets
                .iter()
                .find(|p| contains(&p.data, b"<xfa:datasets"));
            if let Some(packet) = fallback {
                debug!("using packet '{}' holding <xfa:datasets>", packet.name);
                return Ok(Some(packet.data.clone()));
            }
        }

        debug!("XFA packet '{}' not found", wanted);
        Ok(None)
    }
}

impl XfaSource for PdfLoader {
    fn xfa_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let doc = self.open(path)?;
        self.extract(&doc)
    }
}

/// Decrypt with the given password, or with the empty user password that
/// owner-password-only documents carry
fn unlock<E, F>(password: Option<&str>, mut decrypt: F) -> Result<()>
where
    E: fmt::Display,
    F: FnMut(&str) -> std::result::Result<(), E>,
{
    match password {
        Some(password) => {
            debug!("decrypting encrypted PDF");
            decrypt(password)
                .map_err(|e| Error::Extraction(format!("Failed to decrypt PDF: {}", e)))
        }
        None => {
            debug!("decrypting encrypted PDF with the empty user password");
            decrypt("").map_err(|e| {
                Error::Extraction(format!("PDF is encrypted; a password is required ({})", e))
            })
        }
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else bytes as UTF-8
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Follow an indirect reference
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn dictionary<'a>(doc: &'a Document, obj: &'a Object, what: &str) -> Result<&'a Dictionary> {
    resolve(doc, obj)?
        .as_dict()
        .map_err(|_| Error::Extraction(format!("{} is not a dictionary", what)))
}

/// Locate `/Root /AcroForm /XFA`
fn xfa_entry(doc: &Document) -> Result<Option<&Object>> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| Error::Extraction("PDF has no document catalog".to_string()))?;
    let catalog = dictionary(doc, root, "Document catalog")?;

    let acroform = match catalog.get(b"AcroForm") {
        Ok(obj) => dictionary(doc, obj, "AcroForm")?,
        Err(_) => return Ok(None),
    };

    match acroform.get(b"XFA") {
        Ok(obj) => Ok(Some(resolve(doc, obj)?)),
        Err(_) => Ok(None),
    }
}

fn packet_name(obj: &Object) -> Result<String> {
    match obj {
        Object::String(bytes, _) => Ok(decode_text_string(bytes)),
        Object::Name(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => Err(Error::Extraction("XFA packet name is not a string".to_string())),
    }
}

/// Decode a stream, decompressing if needed
fn decode_stream(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| Error::Extraction(format!("Failed to decode XFA stream: {}", e)))
    } else {
        Ok(stream.content.clone())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
