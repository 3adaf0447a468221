//! Unit tests for write handles and outbound commands.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use super::{WriteCommand, WriteHandle, WriteHandleInner};
use crate::{
    codec::{BodyCodec, CodecContext, CodecError, RawBodyCodec},
    connection::ConnectionInfo,
    error::{ErrorCode, WriteError},
    frame::{Frame, StreamId},
    message::ResponseMessage,
};

fn handle_with_capacity<C: BodyCodec>(
    codec: C,
    capacity: usize,
) -> (WriteHandle<C>, mpsc::Receiver<WriteCommand>) {
    let (tx, rx) = mpsc::channel(capacity);
    let inner = WriteHandleInner {
        codec,
        connection: ConnectionInfo::new(1.into(), None),
        tx,
        limiter: None,
    };
    (WriteHandle::from_arc(Arc::new(inner)), rx)
}

#[tokio::test]
async fn write_response_enqueues_one_command_per_response() {
    let (handle, mut rx) = handle_with_capacity(RawBodyCodec, 4);
    let response = ResponseMessage::new(StreamId::new(3))
        .with_body(Bytes::from_static(b"first"));

    handle.write_response(response).await.expect("write failed");

    let command = rx.recv().await.expect("command missing");
    assert_eq!(command.frame_count(), 1);
    let frames = command.into_frames();
    assert!(matches!(
        &frames[0],
        Frame::Data { payload, end_stream: true, .. } if payload.as_ref() == b"first"
    ));
}

#[tokio::test]
async fn sectionless_response_enqueues_nothing() {
    let (handle, mut rx) = handle_with_capacity(RawBodyCodec, 4);
    let response: ResponseMessage<Bytes> = ResponseMessage::new(StreamId::new(3));

    handle.write_response(response).await.expect("write failed");
    drop(handle);

    assert!(rx.recv().await.is_none());
}

struct RejectingCodec;

impl BodyCodec for RejectingCodec {
    type Body = Bytes;

    fn encode(
        &self,
        _ctx: &CodecContext<'_>,
        _body: &Self::Body,
        _dst: &mut BytesMut,
    ) -> Result<(), CodecError> {
        Err(CodecError::new("always rejects"))
    }

    fn decode(&self, _ctx: &CodecContext<'_>, _src: &[u8]) -> Result<Self::Body, CodecError> {
        Err(CodecError::new("always rejects"))
    }
}

#[tokio::test]
async fn encode_failure_surfaces_before_anything_is_enqueued() {
    let (handle, mut rx) = handle_with_capacity(RejectingCodec, 4);
    let response = ResponseMessage::new(StreamId::new(3))
        .with_body(Bytes::from_static(b"body"));

    let error = handle
        .write_response(response)
        .await
        .expect_err("write should fail");

    assert!(matches!(error, WriteError::Codec(_)));
    drop(handle);
    assert!(rx.recv().await.is_none(), "failed encode must enqueue nothing");
}

#[tokio::test]
async fn writes_after_driver_stops_report_closed() {
    let (handle, rx) = handle_with_capacity(RawBodyCodec, 1);
    drop(rx);

    let error = handle
        .send_frame(Frame::Ping { payload: 7 })
        .await
        .expect_err("send should fail");

    assert!(matches!(error, WriteError::Closed));
}

#[tokio::test]
async fn reset_stream_enqueues_a_single_rst_frame() {
    let (handle, mut rx) = handle_with_capacity(RawBodyCodec, 4);

    handle
        .reset_stream(StreamId::new(9), ErrorCode::Cancel)
        .await
        .expect("reset failed");

    let command = rx.recv().await.expect("command missing");
    assert_eq!(
        command,
        WriteCommand::Frame(Frame::RstStream {
            stream_id: StreamId::new(9),
            error_code: ErrorCode::Cancel,
        })
    );
}

#[test]
fn command_frame_counts_match_their_contents() {
    let response = WriteCommand::Response(vec![
        Frame::Ping { payload: 1 },
        Frame::Ping { payload: 2 },
    ]);
    assert_eq!(response.frame_count(), 2);
    assert_eq!(WriteCommand::Frame(Frame::Ping { payload: 3 }).frame_count(), 1);
    assert_eq!(response.into_frames().len(), 2);
}
