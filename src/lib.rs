#![doc(html_root_url = "https://docs.rs/muxwire/latest")]
//! Public API for the `muxwire` library.
//!
//! This crate provides the stream-multiplexed transport layer of an RPC
//! server: a frame listener that demultiplexes interleaved frames into
//! per-stream requests, a pluggable body codec, a response writer with a
//! fixed emission order, and a connection driver tying them together over
//! any frame source and sink.

pub mod codec;
pub mod connection;
pub mod error;
pub mod frame;
pub mod listener;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod sink;
pub mod writer;

pub use codec::{BincodeBodyCodec, BodyCodec, CodecContext, CodecError, RawBodyCodec};
pub use connection::{Connection, ConnectionBuilder, ConnectionId, ConnectionInfo, Settings};
pub use error::{ConnectionError, ErrorCode, StreamError, WriteError};
pub use frame::{Frame, HeaderMap, StreamId};
pub use listener::{FrameListener, FrameOutcome};
pub use message::{RequestMessage, ResponseMessage};
pub use metrics::{
    CONNECTIONS_ACTIVE,
    Direction,
    FRAMES_TOTAL,
    REQUESTS_ASSEMBLED_TOTAL,
    STREAM_ERRORS_TOTAL,
};
pub use registry::ConnectionRegistry;
pub use sink::FrameSink;
pub use writer::{ResponseEncoder, WriteCommand, WriteHandle};
