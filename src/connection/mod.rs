//! Connection driver demultiplexing inbound frames and flushing writes.
//!
//! The driver polls a shutdown token, the outbound write channel, and the
//! inbound frame stream with a `tokio::select!` loop. The `biased` keyword
//! ensures pending writes are flushed before further inbound frames are
//! processed, and each write command's frames go out back-to-back so
//! responses never interleave on the wire.
//!
//! Inbound frames feed the per-connection [`FrameListener`]; every request
//! it assembles is forwarded to the dispatch channel supplied at build
//! time. A stream-scoped decode failure resets that stream and leaves the
//! connection running.

mod settings;
mod state;

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::{Stream, StreamExt};
use leaky_bucket::RateLimiter;
use log::{debug, info, warn};
pub use settings::{
    DEFAULT_INITIAL_WINDOW_SIZE,
    DEFAULT_MAX_HEADER_LIST_SIZE,
    DEFAULT_MAX_PAYLOAD_SIZE,
    Settings,
};
use state::DriverState;
pub use state::open_connections;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    codec::BodyCodec,
    error::ConnectionError,
    frame::Frame,
    listener::FrameListener,
    message::RequestMessage,
    metrics,
    registry::{ConnectionRegistry, Enrolment},
    sink::FrameSink,
    writer::{WriteCommand, WriteHandle, WriteHandleInner},
};

/// Maximum accepted write rate in commands per second.
pub const MAX_WRITE_RATE: usize = 10_000;
/// Maximum accepted write queue capacity.
pub const MAX_WRITE_QUEUE_CAPACITY: usize = 10_000;
/// Write queue capacity used when the builder is not told otherwise.
pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 32;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier assigned to a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }

    fn next() -> Self { Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)) }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Immutable details describing one connection.
///
/// Cloned into codec contexts and log records so stream-level work can
/// name the connection it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionInfo {
    id: ConnectionId,
    peer: Option<SocketAddr>,
}

impl ConnectionInfo {
    /// Create details for connection `id`, optionally recording the peer
    /// address.
    #[must_use]
    pub fn new(id: ConnectionId, peer: Option<SocketAddr>) -> Self { Self { id, peer } }

    /// Identifier of this connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Peer address, when the transport knows it.
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> { self.peer }
}

/// Error returned when a connection is configured with invalid limits.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// The requested write rate is zero or above [`MAX_WRITE_RATE`].
    #[error("invalid write rate: {0} (expected 1..={MAX_WRITE_RATE})")]
    InvalidRate(usize),
    /// The requested queue capacity is zero or above
    /// [`MAX_WRITE_QUEUE_CAPACITY`].
    #[error("invalid write queue capacity: {0} (expected 1..={MAX_WRITE_QUEUE_CAPACITY})")]
    InvalidCapacity(usize),
}

/// Configures and assembles a [`Connection`] and its [`WriteHandle`].
pub struct ConnectionBuilder<C: BodyCodec> {
    codec: C,
    dispatch: mpsc::Sender<RequestMessage<C::Body>>,
    settings: Settings,
    id: ConnectionId,
    peer: Option<SocketAddr>,
    write_capacity: usize,
    write_rate: Option<usize>,
    shutdown: CancellationToken,
    registry: Option<ConnectionRegistry<C>>,
}

impl<C> ConnectionBuilder<C>
where
    C: BodyCodec + Clone,
{
    fn new(codec: C, dispatch: mpsc::Sender<RequestMessage<C::Body>>) -> Self {
        Self {
            codec,
            dispatch,
            settings: Settings::default(),
            id: ConnectionId::next(),
            peer: None,
            write_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            write_rate: None,
            shutdown: CancellationToken::new(),
            registry: None,
        }
    }

    /// Override the automatically assigned connection identifier.
    #[must_use]
    pub fn id(mut self, id: ConnectionId) -> Self {
        self.id = id;
        self
    }

    /// Record the peer address for logging and codec contexts.
    #[must_use]
    pub fn peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Replace the transport settings announced for this connection.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the write queue capacity in commands.
    #[must_use]
    pub fn write_capacity(mut self, capacity: usize) -> Self {
        self.write_capacity = capacity;
        self
    }

    /// Limit outbound commands per second, or `None` for no limit.
    #[must_use]
    pub fn write_rate(mut self, rate: Option<usize>) -> Self {
        self.write_rate = rate;
        self
    }

    /// Use `token` to request shutdown of the driver.
    #[must_use]
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Enrol the connection in `registry` so dispatch tasks can reach it
    /// by id. The entry is withdrawn when the driver is dropped.
    #[must_use]
    pub fn registry(mut self, registry: &ConnectionRegistry<C>) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Assemble the connection and the write handle feeding it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the write rate or queue capacity falls
    /// outside the accepted range.
    pub fn build(self) -> Result<(Connection<C>, WriteHandle<C>), BuildError> {
        if let Some(rate) = self
            .write_rate
            .filter(|rate| *rate == 0 || *rate > MAX_WRITE_RATE)
        {
            return Err(BuildError::InvalidRate(rate));
        }
        if self.write_capacity == 0 || self.write_capacity > MAX_WRITE_QUEUE_CAPACITY {
            return Err(BuildError::InvalidCapacity(self.write_capacity));
        }

        let info = ConnectionInfo::new(self.id, self.peer);
        let (tx, write_rx) = mpsc::channel(self.write_capacity);
        let limiter = self.write_rate.map(|rate| {
            RateLimiter::builder()
                .initial(rate)
                .refill(rate)
                .interval(Duration::from_secs(1))
                .max(rate)
                .build()
        });
        let inner = WriteHandleInner {
            codec: self.codec.clone(),
            connection: info.clone(),
            tx,
            limiter,
        };
        let handle = WriteHandle::from_arc(Arc::new(inner));
        let enrolment = self
            .registry
            .map(|registry| registry.enrol(self.id, &handle));
        let connection = Connection {
            listener: FrameListener::new(self.codec, info),
            write_rx,
            dispatch: Some(self.dispatch),
            settings: self.settings,
            shutdown: self.shutdown,
            state: DriverState::new(),
            _enrolment: enrolment,
        };
        Ok((connection, handle))
    }
}

/// Event selected by the driver loop.
enum Event {
    /// Shutdown was requested via the cancellation token.
    Shutdown,
    /// A write command arrived, or the channel closed (`None`).
    Command(Option<WriteCommand>),
    /// An inbound frame arrived, or the stream ended (`None`).
    Inbound(Option<io::Result<Frame>>),
    /// No source was ready; nothing to do.
    Idle,
}

/// Per-connection driver owning the listener and the outbound queue.
///
/// Built via [`Connection::builder`], then driven to completion with
/// [`Connection::run`]. The driver exits when the inbound stream ends and
/// every write handle has been dropped, or as soon as shutdown is
/// requested.
pub struct Connection<C: BodyCodec> {
    listener: FrameListener<C>,
    write_rx: mpsc::Receiver<WriteCommand>,
    // Dropped as soon as no further request can be assembled, so request
    // handlers draining the channel observe the end of the connection.
    dispatch: Option<mpsc::Sender<RequestMessage<C::Body>>>,
    settings: Settings,
    shutdown: CancellationToken,
    state: DriverState,
    _enrolment: Option<Enrolment<C>>,
}

impl<C> Connection<C>
where
    C: BodyCodec + Clone,
{
    /// Start configuring a connection using `codec` for stream bodies and
    /// `dispatch` as the destination for assembled requests.
    #[must_use]
    pub fn builder(
        codec: C,
        dispatch: mpsc::Sender<RequestMessage<C::Body>>,
    ) -> ConnectionBuilder<C> {
        ConnectionBuilder::new(codec, dispatch)
    }
}

impl<C: BodyCodec> Connection<C> {
    /// Details describing this connection.
    #[must_use]
    pub fn info(&self) -> &ConnectionInfo { self.listener.connection() }

    /// Settings announced for this connection during the handshake.
    #[must_use]
    pub fn settings(&self) -> Settings { self.settings }

    /// Drive the connection until its sources are exhausted.
    ///
    /// `frames` yields inbound frames from the framing layer; `sink`
    /// receives every outbound frame. Requests assembled from complete
    /// streams are forwarded to the dispatch channel, whose sender is
    /// dropped once the inbound stream ends so handlers draining it see
    /// the connection wind down.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Inbound`] when the frame stream fails,
    /// [`ConnectionError::Sink`] when an outbound write fails, and
    /// [`ConnectionError::DispatchClosed`] when the dispatch channel has
    /// been dropped while requests are still arriving.
    pub async fn run<S, K>(mut self, mut frames: S, sink: &mut K) -> Result<(), ConnectionError>
    where
        S: Stream<Item = io::Result<Frame>> + Unpin + Send,
        K: FrameSink,
    {
        let id = self.info().id();
        if self.shutdown.is_cancelled() {
            info!("connection aborted before start: id={id}");
            return Ok(());
        }
        info!(
            "connection opened: id={id}, peer={:?}, open={}",
            self.info().peer(),
            open_connections()
        );
        let result = self.drive(&mut frames, sink).await;
        match &result {
            Ok(()) => info!("connection closed: id={id}"),
            Err(error) => warn!("connection terminated: id={id}, error={error}"),
        }
        result
    }

    async fn drive<S, K>(&mut self, frames: &mut S, sink: &mut K) -> Result<(), ConnectionError>
    where
        S: Stream<Item = io::Result<Frame>> + Unpin + Send,
        K: FrameSink,
    {
        while !self.state.is_done() {
            let event = self.next_event(frames).await;
            self.dispatch_event(event, sink).await?;
        }
        if self.state.is_cancelled() {
            debug!("driver stopped without draining: id={}", self.info().id());
        }
        Ok(())
    }

    async fn next_event<S>(&mut self, frames: &mut S) -> Event
    where
        S: Stream<Item = io::Result<Frame>> + Unpin + Send,
    {
        tokio::select! {
            biased;
            () = Self::wait_shutdown(self.shutdown.clone()), if self.state.is_active() => {
                Event::Shutdown
            }
            command = self.write_rx.recv(), if self.state.writes_open() => {
                Event::Command(command)
            }
            frame = frames.next(), if self.state.inbound_open() => Event::Inbound(frame),
            else => Event::Idle,
        }
    }

    async fn wait_shutdown(token: CancellationToken) { token.cancelled_owned().await; }

    async fn dispatch_event<K>(
        &mut self,
        event: Event,
        sink: &mut K,
    ) -> Result<(), ConnectionError>
    where
        K: FrameSink,
    {
        let id = self.info().id();
        match event {
            Event::Shutdown => {
                info!("shutdown requested: id={id}");
                self.dispatch = None;
                self.state.cancel();
                Ok(())
            }
            Event::Command(Some(command)) => self.flush_command(command, sink).await,
            Event::Command(None) => {
                debug!("write handles dropped: id={id}");
                self.state.mark_writes_done();
                Ok(())
            }
            Event::Inbound(Some(Ok(frame))) => self.process_frame(frame, sink).await,
            Event::Inbound(Some(Err(error))) => Err(ConnectionError::Inbound(error)),
            Event::Inbound(None) => {
                debug!("inbound stream ended: id={id}");
                self.dispatch = None;
                self.state.mark_inbound_done();
                Ok(())
            }
            Event::Idle => Ok(()),
        }
    }

    /// Feed one inbound frame to the listener and act on the outcome.
    ///
    /// An assembled request is forwarded to dispatch. A stream error
    /// resets the offending stream on the wire and keeps the connection
    /// running.
    async fn process_frame<K>(&mut self, frame: Frame, sink: &mut K) -> Result<(), ConnectionError>
    where
        K: FrameSink,
    {
        let id = self.info().id();
        debug!("frame received: id={id}, kind={}", frame.kind());
        metrics::inc_frames(metrics::Direction::Inbound);
        match self.listener.on_frame(frame) {
            Ok(outcome) => {
                if let Some(request) = outcome.into_request() {
                    metrics::inc_requests_assembled();
                    debug!(
                        "request assembled: id={id}, stream={}, correlation={}",
                        request.stream_id(),
                        request.correlation_id()
                    );
                    let dispatch = self
                        .dispatch
                        .as_ref()
                        .ok_or(ConnectionError::DispatchClosed)?;
                    dispatch
                        .send(request)
                        .await
                        .map_err(|_| ConnectionError::DispatchClosed)?;
                }
                Ok(())
            }
            Err(error) => {
                warn!("stream condemned: id={id}, error={error}");
                metrics::inc_stream_errors();
                let reset = Frame::RstStream {
                    stream_id: error.stream_id,
                    error_code: error.code,
                };
                self.emit(reset, sink).await
            }
        }
    }

    /// Flush every frame of `command` before selecting again.
    async fn flush_command<K>(
        &mut self,
        command: WriteCommand,
        sink: &mut K,
    ) -> Result<(), ConnectionError>
    where
        K: FrameSink,
    {
        for frame in command.into_frames() {
            self.emit(frame, sink).await?;
        }
        Ok(())
    }

    async fn emit<K>(&self, frame: Frame, sink: &mut K) -> Result<(), ConnectionError>
    where
        K: FrameSink,
    {
        debug!("frame sent: id={}, kind={}", self.info().id(), frame.kind());
        sink.write_frame(frame)
            .await
            .map_err(ConnectionError::Sink)?;
        metrics::inc_frames(metrics::Direction::Outbound);
        Ok(())
    }
}
