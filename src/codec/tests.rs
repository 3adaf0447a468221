//! Unit tests for the shipped body codecs.

use bincode::{Decode, Encode};
use bytes::{Bytes, BytesMut};
use rstest::{fixture, rstest};

use super::{BincodeBodyCodec, BodyCodec, CodecContext, RawBodyCodec};
use crate::connection::ConnectionInfo;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
struct Invoice {
    id: u64,
    memo: String,
}

#[fixture]
fn info() -> ConnectionInfo { ConnectionInfo::new(1.into(), None) }

#[rstest]
fn raw_codec_passes_bytes_through(info: ConnectionInfo) {
    let codec = RawBodyCodec;
    let ctx = CodecContext::new(&info, None);

    let body = Bytes::from_static(b"opaque payload");
    let mut dst = BytesMut::new();
    codec
        .encode(&ctx, &body, &mut dst)
        .expect("raw encode cannot fail");
    assert_eq!(dst.as_ref(), b"opaque payload");

    let decoded = codec.decode(&ctx, &dst).expect("raw decode cannot fail");
    assert_eq!(decoded, body);
}

#[rstest]
fn bincode_codec_round_trips_derived_types(info: ConnectionInfo) {
    let codec = BincodeBodyCodec::<Invoice>::default();
    let ctx = CodecContext::new(&info, None);

    let body = Invoice {
        id: 42,
        memo: "paid".into(),
    };
    let mut dst = BytesMut::new();
    codec
        .encode(&ctx, &body, &mut dst)
        .expect("encode should succeed");
    let decoded = codec.decode(&ctx, &dst).expect("decode should succeed");
    assert_eq!(decoded, body);
}

#[rstest]
fn bincode_codec_reports_decode_failure_with_source(info: ConnectionInfo) {
    let codec = BincodeBodyCodec::<Invoice>::default();
    let ctx = CodecContext::new(&info, None);

    // A string length prefix pointing past the end of the buffer.
    let err = codec
        .decode(&ctx, &[0xff, 0xff, 0xff])
        .expect_err("truncated input should fail");
    assert_eq!(err.to_string(), "bincode decode failed");
    assert!(std::error::Error::source(&err).is_some());
}

#[rstest]
fn context_exposes_connection_and_headers(info: ConnectionInfo) {
    let headers: crate::frame::HeaderMap = [(":path", "/svc")].into_iter().collect();
    let ctx = CodecContext::new(&info, Some(&headers));
    assert_eq!(ctx.connection().id(), 1.into());
    assert_eq!(
        ctx.headers().and_then(crate::frame::HeaderMap::path),
        Some("/svc"),
    );
}
