//! Response writing and outbound command plumbing.
//!
//! A [`WriteHandle`] is the producer side of a connection's outbound
//! channel. Handles are cheap to clone and safe to hold from any task:
//! each response is encoded up front and enqueued as one command, so the
//! driver flushes its frames back-to-back and responses from concurrent
//! tasks never interleave on the wire.

use std::sync::{Arc, Weak};

use leaky_bucket::RateLimiter;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    codec::BodyCodec,
    connection::ConnectionInfo,
    error::{ErrorCode, WriteError},
    frame::{Frame, StreamId},
    message::ResponseMessage,
};

mod encoder;

pub use encoder::ResponseEncoder;

/// A unit of outbound work consumed by the connection driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteCommand {
    /// The frames of one encoded response, flushed without interleaving.
    Response(Vec<Frame>),
    /// A single frame forwarded unchanged.
    Frame(Frame),
}

impl WriteCommand {
    /// Number of frames this command will put on the wire.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Response(frames) => frames.len(),
            Self::Frame(_) => 1,
        }
    }

    /// Consume the command, yielding its frames in emission order.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        match self {
            Self::Response(frames) => frames,
            Self::Frame(frame) => vec![frame],
        }
    }
}

/// Shared state for [`WriteHandle`].
///
/// Holds the outbound command channel alongside the codec and connection
/// details needed to encode responses, plus an optional rate limiter
/// applied per command.
pub(crate) struct WriteHandleInner<C: BodyCodec> {
    pub(crate) codec: C,
    pub(crate) connection: ConnectionInfo,
    pub(crate) tx: mpsc::Sender<WriteCommand>,
    pub(crate) limiter: Option<RateLimiter>,
}

/// Cloneable handle used by producers to write to a connection.
#[derive(Clone)]
pub struct WriteHandle<C: BodyCodec>(Arc<WriteHandleInner<C>>);

impl<C: BodyCodec> WriteHandle<C> {
    pub(crate) fn from_arc(arc: Arc<WriteHandleInner<C>>) -> Self { Self(arc) }

    /// Downgrade to a `Weak` reference for storage in a registry.
    pub(crate) fn downgrade(&self) -> Weak<WriteHandleInner<C>> { Arc::downgrade(&self.0) }

    /// Details of the connection this handle writes to.
    #[must_use]
    pub fn connection(&self) -> &ConnectionInfo { &self.0.connection }

    /// Internal helper to enqueue a command for the driver.
    ///
    /// Reserves channel capacity before waiting on the rate limiter so a
    /// closed driver is reported without delay.
    async fn enqueue(&self, command: WriteCommand) -> Result<(), WriteError> {
        let permit = self
            .0
            .tx
            .clone()
            .reserve_owned()
            .await
            .map_err(|_| WriteError::Closed)?;

        if let Some(ref limiter) = self.0.limiter {
            limiter.acquire(1).await;
        }

        let returned_tx = permit.send(command);
        // The driver may stop between reserving capacity and sending;
        // report the loss rather than dropping the command silently.
        if returned_tx.is_closed() {
            return Err(WriteError::Closed);
        }
        Ok(())
    }

    /// Encode `response` and enqueue its frames as a single command.
    ///
    /// A response whose sections encode to no frames at all is accepted
    /// and produces nothing on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Codec`] when the body codec rejects the
    /// payload; nothing is enqueued in that case. Returns
    /// [`WriteError::Closed`] when the connection driver has stopped.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use muxwire::{
    ///     codec::RawBodyCodec,
    ///     connection::Connection,
    ///     frame::StreamId,
    ///     message::ResponseMessage,
    /// };
    /// use tokio::runtime::Runtime;
    ///
    /// let rt = Runtime::new().expect("failed to build runtime");
    /// rt.block_on(async {
    ///     let (dispatch_tx, _dispatch_rx) = tokio::sync::mpsc::channel(8);
    ///     let (_connection, handle) = Connection::builder(RawBodyCodec, dispatch_tx)
    ///         .build()
    ///         .expect("failed to build connection");
    ///     let response = ResponseMessage::new(StreamId::new(3))
    ///         .with_body(bytes::Bytes::from_static(b"ok"));
    ///     handle.write_response(response).await.expect("write failed");
    /// });
    /// ```
    pub async fn write_response(
        &self,
        response: ResponseMessage<C::Body>,
    ) -> Result<(), WriteError> {
        let stream_id = response.stream_id();
        let frames =
            ResponseEncoder::new(&self.0.codec, &self.0.connection).encode(response)?;
        if frames.is_empty() {
            debug!(
                id = %self.0.connection.id(),
                stream = %stream_id,
                "response carried no sections"
            );
            return Ok(());
        }
        debug!(
            id = %self.0.connection.id(),
            stream = %stream_id,
            frames = frames.len(),
            "response enqueued"
        );
        self.enqueue(WriteCommand::Response(frames)).await
    }

    /// Enqueue a single frame, bypassing response encoding.
    ///
    /// Used for traffic that is not a response message, such as pings or
    /// settings acknowledgements originated above this layer.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Closed`] when the connection driver has
    /// stopped.
    pub async fn send_frame(&self, frame: Frame) -> Result<(), WriteError> {
        self.enqueue(WriteCommand::Frame(frame)).await
    }

    /// Reset `stream_id` with `code`, abandoning any response for it.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Closed`] when the connection driver has
    /// stopped.
    pub async fn reset_stream(
        &self,
        stream_id: StreamId,
        code: ErrorCode,
    ) -> Result<(), WriteError> {
        debug!(
            id = %self.0.connection.id(),
            stream = %stream_id,
            %code,
            "stream reset requested"
        );
        self.send_frame(Frame::RstStream {
            stream_id,
            error_code: code,
        })
        .await
    }
}

#[cfg(test)]
mod tests;
