//! Pluggable body codecs for request and response payloads.
//!
//! A [`BodyCodec`] converts between raw frame payload bytes and the domain
//! body type carried by request and response messages. The transport is
//! generic over the codec, so the same listener and writer move raw bytes,
//! bincode values, or any application format.
//!
//! Two implementations ship with the crate:
//!
//! - [`RawBodyCodec`] passes payload bytes through untouched. This is the
//!   transport-level default; the layer above owns interpretation.
//! - [`BincodeBodyCodec`] encodes and decodes any type implementing
//!   bincode's `Encode` and `Decode` traits with the standard configuration.
//!
//! # Error Handling
//!
//! Both directions report failures as [`CodecError`], carrying a message and
//! the originating library error as source. On the inbound path the listener
//! converts a decode failure into a stream-scoped protocol error; on the
//! outbound path an encode failure surfaces to the writer before anything
//! is enqueued.

use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};

use crate::{connection::ConnectionInfo, frame::HeaderMap};

pub mod error;

pub use error::CodecError;

/// Context available to a codec during one encode or decode call.
///
/// Carries the originating connection's identity and the header set
/// associated with the payload, when one exists. Borrowed for the duration
/// of the call only.
#[derive(Clone, Copy, Debug)]
pub struct CodecContext<'a> {
    connection: &'a ConnectionInfo,
    headers: Option<&'a HeaderMap>,
}

impl<'a> CodecContext<'a> {
    /// Build a context for one codec call.
    #[must_use]
    pub fn new(connection: &'a ConnectionInfo, headers: Option<&'a HeaderMap>) -> Self {
        Self {
            connection,
            headers,
        }
    }

    /// Identity of the connection the payload belongs to.
    #[must_use]
    pub fn connection(&self) -> &ConnectionInfo { self.connection }

    /// Header set associated with the payload, if any.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> { self.headers }
}

/// Converts between raw payload bytes and a domain body type.
///
/// Implementations must be cheap to share: the listener borrows the codec
/// for decoding and every write handle borrows it for encoding.
pub trait BodyCodec: Send + Sync + 'static {
    /// Domain type carried as a request or response body.
    type Body: Send + 'static;

    /// Encode `body` into `dst`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the body cannot be encoded. `dst` may
    /// hold partial output in that case; callers discard it.
    fn encode(
        &self,
        ctx: &CodecContext<'_>,
        body: &Self::Body,
        dst: &mut BytesMut,
    ) -> Result<(), CodecError>;

    /// Decode a body from `src`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the bytes cannot be parsed into a body.
    fn decode(&self, ctx: &CodecContext<'_>, src: &[u8]) -> Result<Self::Body, CodecError>;
}

/// Codec that passes payload bytes through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawBodyCodec;

impl BodyCodec for RawBodyCodec {
    type Body = Bytes;

    fn encode(
        &self,
        _ctx: &CodecContext<'_>,
        body: &Self::Body,
        dst: &mut BytesMut,
    ) -> Result<(), CodecError> {
        dst.extend_from_slice(body);
        Ok(())
    }

    fn decode(&self, _ctx: &CodecContext<'_>, src: &[u8]) -> Result<Self::Body, CodecError> {
        Ok(Bytes::copy_from_slice(src))
    }
}

/// Codec using `bincode` with its standard configuration.
pub struct BincodeBodyCodec<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> BincodeBodyCodec<M> {
    /// Create a codec for message type `M`.
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl<M> Default for BincodeBodyCodec<M> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> Clone for BincodeBodyCodec<M> {
    fn clone(&self) -> Self { *self }
}

impl<M> Copy for BincodeBodyCodec<M> {}

impl<M> std::fmt::Debug for BincodeBodyCodec<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BincodeBodyCodec").finish()
    }
}

impl<M> BodyCodec for BincodeBodyCodec<M>
where
    M: bincode::Encode + bincode::Decode<()> + Send + 'static,
{
    type Body = M;

    fn encode(
        &self,
        _ctx: &CodecContext<'_>,
        body: &Self::Body,
        dst: &mut BytesMut,
    ) -> Result<(), CodecError> {
        let encoded = bincode::encode_to_vec(body, bincode::config::standard())
            .map_err(|error| CodecError::with_source("bincode encode failed", error))?;
        dst.extend_from_slice(&encoded);
        Ok(())
    }

    fn decode(&self, _ctx: &CodecContext<'_>, src: &[u8]) -> Result<Self::Body, CodecError> {
        let (value, _consumed) = bincode::decode_from_slice(src, bincode::config::standard())
            .map_err(|error| CodecError::with_source("bincode decode failed", error))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests;
