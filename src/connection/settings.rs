//! Transport settings announced when a connection is established.
//!
//! The values mirror the tuning the framing layer applies before any
//! application frames flow. They are carried on the connection so the
//! layer performing the handshake can read them from one place.

/// Initial per-stream flow-control window in bytes.
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 1_048_576;
/// Maximum advertised header list size in bytes.
pub const DEFAULT_MAX_HEADER_LIST_SIZE: u32 = 8_192;
/// Maximum payload size accepted from the peer in bytes.
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 8 * 1024 * 1024;

/// Settings applied to a connection during the transport handshake.
///
/// Concurrent streams are deliberately unbounded: limiting them belongs
/// to admission control above this layer, not the transport.
///
/// # Examples
///
/// ```
/// use muxwire::connection::Settings;
///
/// let settings = Settings {
///     max_payload_size: 1024,
///     ..Settings::default()
/// };
/// assert_eq!(settings.initial_window_size, 1_048_576);
/// assert_eq!(settings.max_concurrent_streams, u32::MAX);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Initial flow-control window granted to each stream, in bytes.
    pub initial_window_size: u32,
    /// Maximum number of concurrently open streams.
    pub max_concurrent_streams: u32,
    /// Maximum total size of a header block, in bytes.
    pub max_header_list_size: u32,
    /// Maximum payload size accepted in a single frame, in bytes.
    pub max_payload_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_concurrent_streams: u32::MAX,
            max_header_list_size: DEFAULT_MAX_HEADER_LIST_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl Settings {
    /// Render the settings as identifier/value pairs for a settings frame.
    ///
    /// Identifiers follow the HTTP/2 registry: `0x4` initial window size,
    /// `0x3` max concurrent streams, `0x6` max header list size,
    /// `0x5` max frame size.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(u16, u32)> {
        vec![
            (0x4, self.initial_window_size),
            (0x3, self.max_concurrent_streams),
            (0x6, self.max_header_list_size),
            (0x5, self.max_payload_size),
        ]
    }
}
