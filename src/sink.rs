//! Outbound frame sink abstraction.
//!
//! The connection driver hands every frame it emits to a [`FrameSink`].
//! Production code backs the sink with the framing layer's encoder; tests
//! collect frames into a `Vec` to assert on ordering without any I/O.

use std::io;

use async_trait::async_trait;

use crate::frame::{Frame, HeaderMap, StreamId};

/// Destination for frames leaving a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Write a single frame to the peer.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the underlying transport rejects the
    /// frame, for example because the connection already closed.
    async fn write_frame(&mut self, frame: Frame) -> io::Result<()>;

    /// Write a headers frame for `stream_id`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`write_frame`](Self::write_frame).
    async fn write_headers(
        &mut self,
        stream_id: StreamId,
        headers: HeaderMap,
        end_stream: bool,
    ) -> io::Result<()> {
        self.write_frame(Frame::Headers {
            stream_id,
            headers,
            padding: 0,
            end_stream,
        })
        .await
    }

    /// Write a data frame for `stream_id`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`write_frame`](Self::write_frame).
    async fn write_data(
        &mut self,
        stream_id: StreamId,
        payload: bytes::Bytes,
        end_stream: bool,
    ) -> io::Result<()> {
        self.write_frame(Frame::Data {
            stream_id,
            payload,
            padding: 0,
            end_stream,
        })
        .await
    }
}

/// Collects frames in memory, preserving emission order.
///
/// Mirrors how driver tests run the loop against a plain vector instead of
/// a socket.
#[async_trait]
impl FrameSink for Vec<Frame> {
    async fn write_frame(&mut self, frame: Frame) -> io::Result<()> {
        self.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn vec_sink_preserves_emission_order() {
        let mut sink: Vec<Frame> = Vec::new();
        let headers: HeaderMap = [(":status", "200")].into_iter().collect();
        sink.write_headers(StreamId::new(3), headers, false)
            .await
            .expect("headers write failed");
        sink.write_data(StreamId::new(3), Bytes::from_static(b"ok"), true)
            .await
            .expect("data write failed");

        assert_eq!(sink.len(), 2);
        assert!(matches!(
            sink[0],
            Frame::Headers { stream_id, end_stream: false, .. } if stream_id == StreamId::new(3)
        ));
        assert!(matches!(
            sink[1],
            Frame::Data { end_stream: true, .. }
        ));
    }
}
