//! Assembled request and outgoing response messages.
//!
//! A [`RequestMessage`] is the product of the frame listener: one logical
//! request whose headers and body arrived as separate frames on a stream. A
//! [`ResponseMessage`] is the input to the response writer and is split back
//! into an ordered frame sequence on the same stream.

use crate::frame::{HeaderMap, StreamId};

/// One fully assembled inbound request.
///
/// The correlation id ties the request to its eventual response; when the
/// peer carries no explicit business id, it defaults to the stream id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestMessage<B> {
    stream_id: StreamId,
    correlation_id: u64,
    headers: Option<HeaderMap>,
    body: Option<B>,
}

impl<B> RequestMessage<B> {
    /// Assemble a request; the correlation id defaults to the stream id.
    #[must_use]
    pub fn new(stream_id: StreamId, headers: Option<HeaderMap>, body: Option<B>) -> Self {
        Self {
            stream_id,
            correlation_id: u64::from(stream_id.as_u32()),
            headers,
            body,
        }
    }

    /// Override the correlation id with an explicit business id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: u64) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Stream the request arrived on.
    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// Id correlating this request with its response.
    #[must_use]
    pub fn correlation_id(&self) -> u64 { self.correlation_id }

    /// Decoded header fields, absent when the peer sent none.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> { self.headers.as_ref() }

    /// Decoded body, absent for header-only requests.
    #[must_use]
    pub fn body(&self) -> Option<&B> { self.body.as_ref() }

    /// Consume the request, returning its body.
    #[must_use]
    pub fn into_body(self) -> Option<B> { self.body }
}

/// One outgoing response destined for a single stream.
///
/// All three sections are optional; present sections are written in the
/// fixed order headers, body, trailers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseMessage<B> {
    stream_id: StreamId,
    headers: Option<HeaderMap>,
    body: Option<B>,
    trailers: Option<HeaderMap>,
}

impl<B> ResponseMessage<B> {
    /// Start an empty response for `stream_id`.
    #[must_use]
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            headers: None,
            body: None,
            trailers: None,
        }
    }

    /// Attach leading headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach trailing headers.
    #[must_use]
    pub fn with_trailers(mut self, trailers: HeaderMap) -> Self {
        self.trailers = Some(trailers);
        self
    }

    /// Stream the response will be written to.
    #[must_use]
    pub fn stream_id(&self) -> StreamId { self.stream_id }

    /// Leading headers, if any.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> { self.headers.as_ref() }

    /// Body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&B> { self.body.as_ref() }

    /// Trailing headers, if any.
    #[must_use]
    pub fn trailers(&self) -> Option<&HeaderMap> { self.trailers.as_ref() }

    /// Split the response into its sections for encoding.
    #[must_use]
    pub fn into_sections(self) -> (StreamId, Option<HeaderMap>, Option<B>, Option<HeaderMap>) {
        (self.stream_id, self.headers, self.body, self.trailers)
    }
}
