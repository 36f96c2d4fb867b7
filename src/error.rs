//! Error types for xfa2data
//!
//! This module defines all error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Result type alias using the xfa2data Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xfa2data operations
#[derive(Error, Debug)]
pub enum Error {
    /// The PDF could not be read, or it carries no XFA packet
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The extracted XFA bytes are not well-formed XML
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The requested output format is not supported
    #[error("unsupported format '{0}': expected one of json, yaml, xml, csv")]
    UnsupportedFormat(String),

    /// Invalid converter configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A converter invariant was violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Extraction(err.to_string())
    }
}

/// XML parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the XFA packet
    pub location: Option<String>,
    /// Source snippet around the failure
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
