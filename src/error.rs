//! Error types shared across the transport adapter.
//!
//! Failures are scoped as narrowly as possible: a [`StreamError`] condemns a
//! single stream and leaves the connection running, a [`WriteError`] is
//! reported to the caller that attempted the write, and only a
//! [`ConnectionError`] terminates the per-connection driver.

use std::io;

use thiserror::Error;

use crate::{codec::CodecError, connection::ConnectionId, frame::StreamId};

/// Protocol error codes carried by reset and goaway frames.
///
/// The numeric values follow the HTTP/2 code registry; codes outside the
/// registry survive round trips via [`ErrorCode::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Graceful shutdown, no error.
    NoError,
    /// Protocol violation detected (code 0x1).
    Protocol,
    /// Unexpected internal error.
    Internal,
    /// Flow-control accounting violated.
    FlowControl,
    /// Settings acknowledgement not received in time.
    SettingsTimeout,
    /// Frame received on a half-closed stream.
    StreamClosed,
    /// Frame size outside the permitted bounds.
    FrameSize,
    /// Stream refused before any processing.
    RefusedStream,
    /// Stream cancelled by its initiator.
    Cancel,
    /// Header compression state corrupted.
    Compression,
    /// Tunnelled connection failed.
    Connect,
    /// Peer asked to reduce load.
    EnhanceYourCalm,
    /// Transport security inadequate.
    InadequateSecurity,
    /// Peer requires HTTP/1.1.
    Http11Required,
    /// Code outside the registered set.
    Unknown(u32),
}

impl ErrorCode {
    /// Convert a wire-level code into its variant.
    #[must_use]
    pub fn from_u32(code: u32) -> Self {
        match code {
            0x0 => Self::NoError,
            0x1 => Self::Protocol,
            0x2 => Self::Internal,
            0x3 => Self::FlowControl,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSize,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::Compression,
            0xa => Self::Connect,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            other => Self::Unknown(other),
        }
    }

    /// Return the wire-level representation of this code.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::NoError => 0x0,
            Self::Protocol => 0x1,
            Self::Internal => 0x2,
            Self::FlowControl => 0x3,
            Self::SettingsTimeout => 0x4,
            Self::StreamClosed => 0x5,
            Self::FrameSize => 0x6,
            Self::RefusedStream => 0x7,
            Self::Cancel => 0x8,
            Self::Compression => 0x9,
            Self::Connect => 0xa,
            Self::EnhanceYourCalm => 0xb,
            Self::InadequateSecurity => 0xc,
            Self::Http11Required => 0xd,
            Self::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.as_u32())
    }
}

/// Failure scoped to a single stream.
///
/// The owning connection stays up; the driver answers a `StreamError` with a
/// reset frame on the offending stream.
#[derive(Debug, Error)]
#[error("stream {stream_id} failed with code {code}: {source}")]
pub struct StreamError {
    /// Stream the failure is confined to.
    pub stream_id: StreamId,
    /// Code reported to the peer in the reset frame.
    pub code: ErrorCode,
    /// Underlying codec failure.
    #[source]
    pub source: CodecError,
}

impl StreamError {
    /// Wrap a codec failure as a protocol error on `stream_id`.
    #[must_use]
    pub fn codec(stream_id: StreamId, source: CodecError) -> Self {
        Self {
            stream_id,
            code: ErrorCode::Protocol,
            source,
        }
    }
}

/// Errors produced when submitting outbound work to a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    /// Encoding the response body failed; nothing was enqueued.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    /// The connection's write channel is closed.
    #[error("connection closed")]
    Closed,
    /// The registry holds no live entry for the addressed connection.
    #[error("no live connection enrolled for {0}")]
    UnknownConnection(ConnectionId),
}

/// Terminal failures of the per-connection driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Reading from the inbound frame stream failed.
    #[error("inbound transport error: {0}")]
    Inbound(#[source] io::Error),
    /// Writing to the frame sink failed.
    #[error("frame sink error: {0}")]
    Sink(#[source] io::Error),
    /// The request dispatch channel was dropped by its receiver.
    #[error("request dispatch channel closed")]
    DispatchClosed,
}
