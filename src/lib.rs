//! # xfa2data
//!
//! Extract the XFA (XML Forms Architecture) packet embedded in an interactive
//! PDF form and convert it to JSON, YAML, XML or CSV.
//!
//! ## Conversion model
//!
//! The XFA packet is parsed into an [`documents::Element`] tree, folded into a
//! generic [`values::Value`] tree by the [`converters::Normalizer`], and
//! serialized by one [`converters::Emitter`] per output format:
//!
//! - attributes become `@name` entries, element text becomes a `#text` entry
//! - a childless element without attributes becomes a plain string
//! - sibling elements sharing a tag become a list, a lone element does not
//!
//! ## Example
//!
//! ```rust,ignore
//! use xfa2data::{FormatKind, Xfa};
//!
//! let xfa = Xfa::open("sample_form.pdf")?;
//!
//! // Convert to a string
//! let json = xfa.convert(FormatKind::Json)?;
//!
//! // Write sample_form.pdf.csv next to the PDF
//! xfa.save(FormatKind::Csv, None)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// XFA packet loading and parsing
pub mod documents;
pub mod loaders;

// Data conversion
pub mod converters;
pub mod values;

// Facade
pub mod xfa;

// Re-exports for convenience
pub use converters::{ConverterConfig, FormatKind};
pub use error::{Error, Result};
pub use loaders::{Packet, PdfLoader, XfaSource};
pub use values::Value;
pub use xfa::{Xfa, XfaOptions};

/// Version of the xfa2data library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XDP namespace of the XFA container document
pub const XDP_NAMESPACE: &str = "http://ns.adobe.com/xdp/";

/// Namespace of the XFA datasets packet
pub const XFA_DATA_NAMESPACE: &str = "http://www.xfa.org/schema/xfa-data/1.0/";
