//! Pure encoding of response messages into ordered frame sequences.

use bytes::BytesMut;

use crate::{
    codec::{BodyCodec, CodecContext, CodecError},
    connection::ConnectionInfo,
    frame::Frame,
    message::ResponseMessage,
};

/// Encodes a [`ResponseMessage`] into the frames that represent it on the
/// wire.
///
/// The encoder is pure: it borrows the codec and connection details and
/// returns the frame sequence without touching any transport. Emission
/// order is fixed at headers, then data, then trailers, with the
/// `end_stream` flag landing on the last frame that exists:
///
/// - leading headers are emitted only when present and non-empty, never
///   ending the stream;
/// - the data frame ends the stream exactly when no trailers follow;
/// - trailers are emitted whenever present, even when empty, and always
///   end the stream.
///
/// When body encoding fails the scratch buffer is dropped before the error
/// reaches the caller, and no frame of the response is produced.
pub struct ResponseEncoder<'a, C> {
    codec: &'a C,
    connection: &'a ConnectionInfo,
}

impl<'a, C: BodyCodec> ResponseEncoder<'a, C> {
    /// Create an encoder borrowing `codec` and `connection`.
    #[must_use]
    pub fn new(codec: &'a C, connection: &'a ConnectionInfo) -> Self {
        Self { codec, connection }
    }

    /// Encode `response` into its ordered frame sequence.
    ///
    /// Returns an empty vector when the response carries no sections at
    /// all.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the body codec rejects the payload.
    /// Nothing is emitted in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use muxwire::{
    ///     codec::RawBodyCodec,
    ///     connection::ConnectionInfo,
    ///     frame::{Frame, HeaderMap, StreamId},
    ///     message::ResponseMessage,
    ///     writer::ResponseEncoder,
    /// };
    ///
    /// let info = ConnectionInfo::new(1.into(), None);
    /// let codec = RawBodyCodec;
    /// let headers: HeaderMap = [(":status", "200")].into_iter().collect();
    /// let response = ResponseMessage::new(StreamId::new(3))
    ///     .with_headers(headers)
    ///     .with_body(bytes::Bytes::from_static(b"ok"));
    ///
    /// let frames = ResponseEncoder::new(&codec, &info)
    ///     .encode(response)
    ///     .expect("encoding failed");
    /// assert_eq!(frames.len(), 2);
    /// assert!(matches!(frames[1], Frame::Data { end_stream: true, .. }));
    /// ```
    pub fn encode(&self, response: ResponseMessage<C::Body>) -> Result<Vec<Frame>, CodecError> {
        let (stream_id, headers, body, trailers) = response.into_sections();

        // Encode before emitting anything so a failing codec leaves no
        // partial sequence behind. The scratch buffer is dropped on the
        // error path.
        let payload = match body {
            Some(body) => {
                let ctx = CodecContext::new(self.connection, headers.as_ref());
                let mut buf = BytesMut::new();
                self.codec.encode(&ctx, &body, &mut buf)?;
                Some(buf.freeze())
            }
            None => None,
        };

        let mut frames = Vec::with_capacity(3);
        if let Some(headers) = headers.filter(|headers| !headers.is_empty()) {
            frames.push(Frame::Headers {
                stream_id,
                headers,
                padding: 0,
                end_stream: false,
            });
        }
        if let Some(payload) = payload {
            frames.push(Frame::Data {
                stream_id,
                payload,
                padding: 0,
                end_stream: trailers.is_none(),
            });
        }
        if let Some(trailers) = trailers {
            frames.push(Frame::Headers {
                stream_id,
                headers: trailers,
                padding: 0,
                end_stream: true,
            });
        }
        Ok(frames)
    }
}

#[cfg(test)]
#[path = "encoder_tests.rs"]
mod tests;
