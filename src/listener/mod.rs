//! Per-connection frame listener state machine.
//!
//! A [`FrameListener`] consumes one connection's frames in arrival order and
//! decides, per frame, whether a logical request is now complete. Headers
//! arriving ahead of their body are parked in a [`StreamHeaderCache`] keyed
//! by stream id; a data frame carrying the end-of-stream flag collects the
//! cached headers and hands both to the [`RequestAssembler`].
//!
//! Per stream the listener moves through `AwaitingHeaders`, `HeadersCached`,
//! and the terminal `Completed` or `Reset`. The states are not materialised:
//! presence in the cache is `HeadersCached`, absence is `AwaitingHeaders`,
//! and both terminal transitions clear the cache entry, which keeps the
//! no-leak property a matter of map occupancy.
//!
//! The listener is sans-I/O. It is driven by the connection task, which
//! guarantees frames for one connection are processed sequentially; nothing
//! here needs a lock.
//!
//! Control frames (settings, ping, priority, window updates, goaway, push
//! promises, unknown types) produce no request and no state change. Each is
//! an intentional no-op arm, with peer resets logged at error level and
//! pings at warn level.

use log::{debug, error, warn};

use crate::{
    codec::BodyCodec,
    connection::ConnectionInfo,
    error::StreamError,
    frame::{Frame, StreamId},
    message::RequestMessage,
};

mod assembler;
mod header_cache;

pub use assembler::RequestAssembler;
pub use header_cache::StreamHeaderCache;

/// Result of feeding one frame to the listener.
#[derive(Debug)]
pub struct FrameOutcome<B> {
    request: Option<RequestMessage<B>>,
    processed: usize,
}

impl<B> FrameOutcome<B> {
    fn none() -> Self {
        Self {
            request: None,
            processed: 0,
        }
    }

    fn with_processed(processed: usize) -> Self {
        Self {
            request: None,
            processed,
        }
    }

    fn completed(request: RequestMessage<B>, processed: usize) -> Self {
        Self {
            request: Some(request),
            processed,
        }
    }

    /// Bytes the framing layer should credit back to the flow-control
    /// window for this frame: payload plus padding for data frames, zero
    /// for everything else.
    #[must_use]
    pub fn processed(&self) -> usize { self.processed }

    /// Whether this frame completed a request.
    #[must_use]
    pub fn has_request(&self) -> bool { self.request.is_some() }

    /// Consume the outcome, returning the completed request if any.
    #[must_use]
    pub fn into_request(self) -> Option<RequestMessage<B>> { self.request }
}

/// State machine demultiplexing one connection's interleaved frames.
#[derive(Debug)]
pub struct FrameListener<C: BodyCodec> {
    assembler: RequestAssembler<C>,
    cache: StreamHeaderCache,
}

impl<C: BodyCodec> FrameListener<C> {
    /// Create a listener for one connection.
    #[must_use]
    pub fn new(codec: C, connection: ConnectionInfo) -> Self {
        Self {
            assembler: RequestAssembler::new(codec, connection),
            cache: StreamHeaderCache::new(),
        }
    }

    /// Connection identity the listener serves.
    #[must_use]
    pub fn connection(&self) -> &ConnectionInfo { self.assembler.connection() }

    /// Number of streams with headers parked in the cache.
    #[must_use]
    pub fn pending_headers(&self) -> usize { self.cache.len() }

    /// True when headers are parked for `stream_id`.
    #[must_use]
    pub fn has_pending(&self, stream_id: StreamId) -> bool {
        self.cache.get(stream_id).is_some()
    }

    /// Feed the next frame in arrival order.
    ///
    /// The caller must deliver one connection's frames sequentially; the
    /// listener holds per-stream state across calls.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamError`] when a completed stream's body fails to
    /// decode. Only that stream is condemned; the listener remains valid
    /// and its cache entry for the stream is already cleared.
    pub fn on_frame(&mut self, frame: Frame) -> Result<FrameOutcome<C::Body>, StreamError> {
        match frame {
            Frame::Headers {
                stream_id,
                headers,
                padding: _,
                end_stream,
            } => {
                if stream_id.is_connection_control() {
                    debug!(
                        "ignoring headers on control stream: id={}",
                        self.connection().id(),
                    );
                    return Ok(FrameOutcome::none());
                }
                if end_stream {
                    // Header-only request; any stale cache entry dies with it.
                    self.cache.remove(stream_id);
                    let request = self.assembler.assemble(stream_id, Some(headers), None)?;
                    return Ok(FrameOutcome::completed(request, 0));
                }
                if self.cache.insert(stream_id, headers).is_some() {
                    debug!(
                        "replaced pending headers: id={}, stream={stream_id}",
                        self.connection().id(),
                    );
                }
                Ok(FrameOutcome::none())
            }
            Frame::Data {
                stream_id,
                payload,
                padding,
                end_stream,
            } => {
                let processed = payload.len() + padding;
                if !end_stream {
                    // Partial body chunks are buffered below this layer.
                    return Ok(FrameOutcome::with_processed(processed));
                }
                let headers = self.cache.take(stream_id);
                let request = self
                    .assembler
                    .assemble(stream_id, headers, Some(&payload))?;
                Ok(FrameOutcome::completed(request, processed))
            }
            Frame::RstStream {
                stream_id,
                error_code,
            } => {
                error!(
                    "stream reset by peer: id={}, stream={stream_id}, code={error_code}",
                    self.connection().id(),
                );
                self.cache.remove(stream_id);
                Ok(FrameOutcome::none())
            }
            Frame::Ping { payload } => {
                warn!("ping received: id={}, payload={payload}", self.connection().id());
                Ok(FrameOutcome::none())
            }
            Frame::PingAck { payload } => {
                warn!(
                    "ping ack received: id={}, payload={payload}",
                    self.connection().id(),
                );
                Ok(FrameOutcome::none())
            }
            // Control traffic with no bearing on request boundaries.
            Frame::Settings { .. }
            | Frame::SettingsAck
            | Frame::Priority { .. }
            | Frame::WindowUpdate { .. }
            | Frame::GoAway { .. }
            | Frame::PushPromise { .. }
            | Frame::Unknown { .. } => Ok(FrameOutcome::none()),
        }
    }
}
