//! XFA facade
//!
//! [`Xfa`] ties the pieces together: it extracts the XFA packet of a PDF
//! once, keeps the parsed element tree, and converts it on demand.
//!
//! ```rust,ignore
//! use xfa2data::{FormatKind, Xfa};
//!
//! let xfa = Xfa::open("sample_form.pdf")?;
//! println!("{}", xfa.convert(FormatKind::Json)?);
//!
//! // Writes sample_form.pdf.yaml
//! xfa.save(FormatKind::Yaml, None)?;
//! ```

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::converters::{create_emitter, ConverterConfig, FormatKind, Normalizer};
use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::{Packet, PdfLoader, XfaSource};
use crate::values::Value;

/// Options for opening and converting an XFA form
#[derive(Debug, Clone, Default)]
pub struct XfaOptions {
    /// Password for encrypted documents
    pub password: Option<String>,
    /// Packet to extract
    pub packet: Packet,
    /// Parsing limits
    pub limits: Limits,
    /// Key conventions and output layout
    pub converter: ConverterConfig,
}

impl XfaOptions {
    /// Create options with default values
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

    /// Set the parsing limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the converter configuration
    pub fn with_converter(mut self, converter: ConverterConfig) -> Self {
        self.converter = converter;
        self
    }

    fn loader(&self) -> PdfLoader {
        let loader = PdfLoader::new().with_packet(self.packet.clone());
        match &self.password {
            Some(password) => loader.with_password(password.clone()),
            None => loader,
        }
    }
}

/// An XFA form extracted from a PDF
#[derive(Debug, Clone)]
pub struct Xfa {
    source: Option<PathBuf>,
    xml: Vec<u8>,
    root: Element,
    config: ConverterConfig,
}

impl Xfa {
    /// Open a PDF and extract its XFA packet with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, XfaOptions::default())
    }

    /// Open a PDF and extract its XFA packet
    pub fn open_with(path: impl AsRef<Path>, options: XfaOptions) -> Result<Self> {
        let loader = options.loader();
        Self::from_source(path, &loader, options)
    }

    /// Extract the XFA packet through a custom source
    pub fn from_source(
        path: impl AsRef<Path>,
        source: &dyn XfaSource,
        options: XfaOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        options.converter.validate()?;

        let xml = source.xfa_bytes(path)?.ok_or_else(|| {
            Error::Extraction(format!("No XFA packet found in '{}'", path.display()))
        })?;
        debug!("extracted {} bytes of XFA from '{}'", xml.len(), path.display());

        let mut xfa = Self::from_xml(xml, options)?;
        xfa.source = Some(path.to_path_buf());
        Ok(xfa)
    }

    /// Build from raw XFA XML that did not come from a file
    pub fn from_xml(xml: impl Into<Vec<u8>>, options: XfaOptions) -> Result<Self> {
        options.converter.validate()?;
        let xml = xml.into();
        let root = Document::parse_with_limits(&xml, &options.limits)?.into_root();

        Ok(Self {
            source: None,
            xml,
            root,
            config: options.converter,
        })
    }

    /// Path of the source PDF, if any
    pub fn path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Raw XFA XML bytes
    pub fn raw_xml(&self) -> &[u8] {
        &self.xml
    }

    /// Parsed root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Converter configuration
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Build a fresh value tree for the whole document
    pub fn to_value(&self) -> Value {
        Normalizer::new(&self.config).normalize_document(&self.root)
    }

    /// Convert the form to text in the given format
    pub fn convert(&self, format: FormatKind) -> Result<String> {
        let value = self.to_value();
        create_emitter(format, &self.config).emit(&value)
    }

    /// Convert the form to a format given by name (`json`, `yaml`, `xml`, `csv`)
    pub fn convert_named(&self, format: &str) -> Result<String> {
        self.convert(format.parse()?)
    }

    /// Default output path: the source path with `.<ext>` appended
    pub fn default_output_path(&self, format: FormatKind) -> Option<PathBuf> {
        self.source.as_deref().map(|source| {
            let mut name = OsString::from(source.as_os_str());
            name.push(".");
            name.push(format.extension());
            PathBuf::from(name)
        })
    }

    /// Convert and write the form to `path`, or to the default output path.
    ///
    /// The output is written to a temporary file next to the target and
    /// renamed into place, so a failed write leaves no partial file behind.
    pub fn save(&self, format: FormatKind, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(format).ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "no output path given and the form has no source path",
                ))
            })?,
        };

        let output = self.convert(format)?;
        write_atomic(&target, output.as_bytes())?;
        info!("wrote {} output to '{}'", format, target.display());
        Ok(target)
    }

    /// Save using a format given by name
    pub fn save_named(&self, format: &str, path: Option<&Path>) -> Result<PathBuf> {
        self.save(format.parse()?, path)
    }
}

fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
