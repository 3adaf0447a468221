//! Frame model for the multiplexed transport.
//!
//! A [`Frame`] is one unit of wire transmission, already parsed by the
//! framing layer. The listener consumes frames one at a time per connection;
//! the driver writes them back out through a [`FrameSink`].
//!
//! [`FrameSink`]: crate::sink::FrameSink

use bytes::Bytes;

use crate::error::ErrorCode;

pub mod headers;

pub use headers::{HeaderDecodeError, HeaderMap, percent_decode};

/// Identifier of one logical stream within a connection.
///
/// Stream ids are unique for the lifetime of their connection. Id zero is
/// the connection control stream and never carries requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

impl From<u32> for StreamId {
    fn from(value: u32) -> Self { Self(value) }
}

impl StreamId {
    /// Create a new [`StreamId`] with the provided value.
    #[must_use]
    pub fn new(id: u32) -> Self { Self(id) }

    /// Return the inner `u32` representation.
    #[must_use]
    pub fn as_u32(self) -> u32 { self.0 }

    /// True for the connection control stream (id zero).
    #[must_use]
    pub fn is_connection_control(self) -> bool { self.0 == 0 }

    /// True for odd ids, which peers assign to client-initiated streams.
    #[must_use]
    pub fn is_client_initiated(self) -> bool { self.0 % 2 == 1 }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminant of a [`Frame`], used for logging and metrics labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Header block for one stream.
    Headers,
    /// Body bytes for one stream.
    Data,
    /// Peer settings update.
    Settings,
    /// Acknowledgement of a settings update.
    SettingsAck,
    /// Liveness probe.
    Ping,
    /// Answer to a liveness probe.
    PingAck,
    /// Early stream termination.
    RstStream,
    /// Stream priority hint.
    Priority,
    /// Flow-control credit grant.
    WindowUpdate,
    /// Connection shutdown notice.
    GoAway,
    /// Server-initiated stream announcement.
    PushPromise,
    /// Frame type outside the known set.
    Unknown,
}

impl FrameKind {
    /// Stable lowercase name for logs and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Data => "data",
            Self::Settings => "settings",
            Self::SettingsAck => "settings_ack",
            Self::Ping => "ping",
            Self::PingAck => "ping_ack",
            Self::RstStream => "rst_stream",
            Self::Priority => "priority",
            Self::WindowUpdate => "window_update",
            Self::GoAway => "goaway",
            Self::PushPromise => "push_promise",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed unit of wire transmission.
///
/// Variants mirror the frame vocabulary of an HTTP/2-style multiplexed
/// protocol. The listener reacts to header, data, and reset frames; the
/// remaining variants are control traffic that is logged and otherwise
/// ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Header block for one stream.
    Headers {
        /// Stream the headers belong to.
        stream_id: StreamId,
        /// Decoded header fields.
        headers: HeaderMap,
        /// Padding bytes accompanying the block on the wire.
        padding: usize,
        /// No further frames follow on this stream from the peer.
        end_stream: bool,
    },
    /// Body bytes for one stream.
    Data {
        /// Stream the payload belongs to.
        stream_id: StreamId,
        /// Raw body bytes.
        payload: Bytes,
        /// Padding bytes accompanying the payload on the wire.
        padding: usize,
        /// No further frames follow on this stream from the peer.
        end_stream: bool,
    },
    /// Peer settings update as raw identifier/value pairs.
    Settings {
        /// Setting identifier and value pairs in wire order.
        pairs: Vec<(u16, u32)>,
    },
    /// Acknowledgement of a previously sent settings update.
    SettingsAck,
    /// Liveness probe carrying opaque payload.
    Ping {
        /// Opaque probe payload, echoed by the answer.
        payload: u64,
    },
    /// Answer to a liveness probe.
    PingAck {
        /// Payload echoed from the probe.
        payload: u64,
    },
    /// Early termination of one stream.
    RstStream {
        /// Stream being terminated.
        stream_id: StreamId,
        /// Reason reported by the peer.
        error_code: ErrorCode,
    },
    /// Priority hint for one stream.
    Priority {
        /// Stream the hint applies to.
        stream_id: StreamId,
        /// Stream this one depends on.
        dependency: StreamId,
        /// Relative weight within the dependency.
        weight: u8,
        /// Whether the dependency is exclusive.
        exclusive: bool,
    },
    /// Flow-control credit grant.
    WindowUpdate {
        /// Stream receiving credit; zero for the whole connection.
        stream_id: StreamId,
        /// Additional bytes the peer may receive.
        increment: u32,
    },
    /// Connection shutdown notice.
    GoAway {
        /// Highest stream id the peer may have processed.
        last_stream_id: StreamId,
        /// Reason for the shutdown.
        error_code: ErrorCode,
        /// Opaque diagnostic payload.
        debug_data: Bytes,
    },
    /// Announcement of a server-initiated stream.
    PushPromise {
        /// Stream the promise is sent on.
        stream_id: StreamId,
        /// Stream id reserved for the pushed response.
        promised_stream_id: StreamId,
        /// Header fields of the promised request.
        headers: HeaderMap,
        /// Padding bytes accompanying the block on the wire.
        padding: usize,
    },
    /// Frame type outside the known set, carried opaquely.
    Unknown {
        /// Wire-level frame type identifier.
        frame_type: u8,
        /// Stream the frame arrived on.
        stream_id: StreamId,
        /// Unparsed payload bytes.
        payload: Bytes,
    },
}

impl Frame {
    /// The stream this frame belongs to, if it is stream-scoped.
    ///
    /// Connection-scoped frames (settings, ping, goaway) return `None`.
    #[must_use]
    pub fn stream_id(&self) -> Option<StreamId> {
        match self {
            Self::Headers { stream_id, .. }
            | Self::Data { stream_id, .. }
            | Self::RstStream { stream_id, .. }
            | Self::Priority { stream_id, .. }
            | Self::PushPromise { stream_id, .. }
            | Self::Unknown { stream_id, .. } => Some(*stream_id),
            Self::WindowUpdate { stream_id, .. } => {
                (!stream_id.is_connection_control()).then_some(*stream_id)
            }
            Self::Settings { .. }
            | Self::SettingsAck
            | Self::Ping { .. }
            | Self::PingAck { .. }
            | Self::GoAway { .. } => None,
        }
    }

    /// Discriminant of this frame.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Headers { .. } => FrameKind::Headers,
            Self::Data { .. } => FrameKind::Data,
            Self::Settings { .. } => FrameKind::Settings,
            Self::SettingsAck => FrameKind::SettingsAck,
            Self::Ping { .. } => FrameKind::Ping,
            Self::PingAck { .. } => FrameKind::PingAck,
            Self::RstStream { .. } => FrameKind::RstStream,
            Self::Priority { .. } => FrameKind::Priority,
            Self::WindowUpdate { .. } => FrameKind::WindowUpdate,
            Self::GoAway { .. } => FrameKind::GoAway,
            Self::PushPromise { .. } => FrameKind::PushPromise,
            Self::Unknown { .. } => FrameKind::Unknown,
        }
    }

    /// Bytes the framing layer should count against the flow-control window.
    ///
    /// Only data frames consume window credit: their payload plus padding.
    /// Every other frame reports zero.
    #[must_use]
    pub fn flow_credit(&self) -> usize {
        match self {
            Self::Data {
                payload, padding, ..
            } => payload.len() + padding,
            _ => 0,
        }
    }

    /// Whether this frame closes its stream in the peer's direction.
    #[must_use]
    pub fn is_end_stream(&self) -> bool {
        matches!(
            self,
            Self::Headers {
                end_stream: true, ..
            } | Self::Data {
                end_stream: true, ..
            }
        )
    }
}
