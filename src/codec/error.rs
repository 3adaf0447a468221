//! Error type for the body codec layer.
//!
//! A [`CodecError`] reports that payload bytes could not be converted to or
//! from a domain body. It carries a human-readable message and, where the
//! failure originated in a serialisation library, the original error as
//! source. Codec failures are always caught at the assembler or writer
//! boundary and never terminate a connection on their own.

use std::error::Error;

/// Failure raised by a [`BodyCodec`] during encode or decode.
///
/// [`BodyCodec`]: crate::codec::BodyCodec
///
/// # Examples
///
/// ```
/// use muxwire::codec::CodecError;
///
/// let err = CodecError::new("body truncated");
/// assert_eq!(err.to_string(), "body truncated");
/// assert!(std::error::Error::source(&err).is_none());
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl CodecError {
    /// Create an error with a message and no source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping the library failure that caused it.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str { &self.message }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
