//! Header sets and form-style percent decoding.
//!
//! Header names and values are plain strings; duplicate names are
//! last-write-wins. Values arrive percent-encoded on the inbound path and
//! are decoded per value, so one malformed value never condemns its
//! siblings.

use std::collections::HashMap;

use thiserror::Error;

/// Pseudo-header naming the request method.
pub const METHOD: &str = ":method";
/// Pseudo-header naming the request path.
pub const PATH: &str = ":path";
/// Pseudo-header naming the response status.
pub const STATUS: &str = ":status";

/// Failure to percent-decode a single header value.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderDecodeError {
    /// A `%` escape was truncated or contained a non-hex digit.
    #[error("malformed percent escape at byte {position}")]
    InvalidEscape {
        /// Byte offset of the offending `%`.
        position: usize,
    },
    /// The decoded bytes were not valid UTF-8.
    #[error("decoded value is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode a form-style percent-encoded value as UTF-8.
///
/// `+` decodes to a space and `%XX` to the byte it names. The whole value
/// must decode to valid UTF-8.
///
/// # Errors
///
/// Returns [`HeaderDecodeError::InvalidEscape`] for a truncated or non-hex
/// escape and [`HeaderDecodeError::InvalidUtf8`] when the decoded bytes are
/// not UTF-8.
///
/// # Examples
///
/// ```
/// use muxwire::frame::percent_decode;
///
/// assert_eq!(percent_decode("a%20b").as_deref(), Ok("a b"));
/// assert_eq!(percent_decode("a+b").as_deref(), Ok("a b"));
/// assert!(percent_decode("bad%2").is_err());
/// ```
pub fn percent_decode(value: &str) -> Result<String, HeaderDecodeError> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => return Err(HeaderDecodeError::InvalidEscape { position: i }),
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| HeaderDecodeError::InvalidUtf8)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Unordered set of header fields with last-write-wins semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: HashMap<String, String>,
}

impl HeaderMap {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert a field, returning the previous value for the name if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.entries.insert(name.into(), value.into())
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> { self.entries.get(name).map(String::as_str) }

    /// Remove a field by name, returning its value if present.
    pub fn remove(&mut self, name: &str) -> Option<String> { self.entries.remove(name) }

    /// True when the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(name) }

    /// Number of fields in the set.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// True when the set holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Iterate over the fields in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `:method` pseudo-header, if present.
    #[must_use]
    pub fn method(&self) -> Option<&str> { self.get(METHOD) }

    /// The `:path` pseudo-header, if present.
    #[must_use]
    pub fn path(&self) -> Option<&str> { self.get(PATH) }

    /// The `:status` pseudo-header, if present.
    #[must_use]
    pub fn status(&self) -> Option<&str> { self.get(STATUS) }
}

impl<N, V> FromIterator<(N, V)> for HeaderMap
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();
        Self { entries }
    }
}

impl IntoIterator for HeaderMap {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter { self.entries.into_iter() }
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
