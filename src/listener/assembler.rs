//! Builds request messages from finalised stream state.

use log::debug;

use crate::{
    codec::{BodyCodec, CodecContext},
    connection::ConnectionInfo,
    error::StreamError,
    frame::{HeaderMap, StreamId, percent_decode},
    message::RequestMessage,
};

/// Assembles one request from a completed stream's headers and body bytes.
///
/// Header values are percent-decoded individually; a value that fails to
/// decode drops that single header and keeps its siblings. Body decode
/// delegates to the codec, and a codec failure condemns the stream rather
/// than the connection.
#[derive(Debug)]
pub struct RequestAssembler<C> {
    codec: C,
    connection: ConnectionInfo,
}

impl<C: BodyCodec> RequestAssembler<C> {
    /// Create an assembler bound to one connection's codec and identity.
    #[must_use]
    pub fn new(codec: C, connection: ConnectionInfo) -> Self {
        Self { codec, connection }
    }

    /// Connection identity used for codec context and logging.
    #[must_use]
    pub fn connection(&self) -> &ConnectionInfo { &self.connection }

    /// Codec used for body decoding.
    #[must_use]
    pub fn codec(&self) -> &C { &self.codec }

    /// Assemble the request completed on `stream_id`.
    ///
    /// `raw_headers` is the cached header set, absent when the peer sent a
    /// data frame with no preceding headers; that absence is tolerated and
    /// preserved on the resulting message.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamError`] carrying the protocol code when the body
    /// cannot be decoded.
    pub fn assemble(
        &self,
        stream_id: StreamId,
        raw_headers: Option<HeaderMap>,
        body: Option<&[u8]>,
    ) -> Result<RequestMessage<C::Body>, StreamError> {
        let headers = raw_headers.map(|raw| self.decode_headers(stream_id, raw));
        let body = match body {
            Some(bytes) => {
                let ctx = CodecContext::new(&self.connection, headers.as_ref());
                let decoded = self
                    .codec
                    .decode(&ctx, bytes)
                    .map_err(|error| StreamError::codec(stream_id, error))?;
                Some(decoded)
            }
            None => None,
        };
        Ok(RequestMessage::new(stream_id, headers, body))
    }

    /// Percent-decode each header value, skipping values that fail.
    fn decode_headers(&self, stream_id: StreamId, raw: HeaderMap) -> HeaderMap {
        let mut decoded = HeaderMap::new();
        for (name, value) in raw {
            match percent_decode(&value) {
                Ok(value) => {
                    decoded.insert(name, value);
                }
                Err(error) => {
                    debug!(
                        "dropping undecodable header value: id={}, stream={stream_id}, name={name}, error={error}",
                        self.connection.id(),
                    );
                }
            }
        }
        decoded
    }
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
