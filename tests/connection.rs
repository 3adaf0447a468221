//! End-to-end connection lifecycle tests.
//!
//! These wire a request handler to the dispatch channel and drive a full
//! connection, asserting on the frames a peer would see and on the
//! connection gauge. Tests share a serial group because the gauge is
//! process-wide.

mod common;

use std::collections::BTreeSet;

use bytes::Bytes;
use common::{data_frame, headers_frame};
use futures::{Stream, stream};
use muxwire::{
    Connection,
    codec::RawBodyCodec,
    connection::open_connections,
    error::WriteError,
    frame::{Frame, HeaderMap, StreamId},
    message::{RequestMessage, ResponseMessage},
};
use serial_test::serial;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn inbound(frames: Vec<Frame>) -> impl Stream<Item = std::io::Result<Frame>> + Unpin + Send {
    stream::iter(frames.into_iter().map(Ok))
}

fn status_headers() -> HeaderMap { [(":status", "200")].into_iter().collect() }

#[tokio::test]
#[serial(connection_lifecycle)]
async fn requests_round_trip_to_responses() {
    let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<RequestMessage<Bytes>>(8);
    let (connection, handle) = Connection::builder(RawBodyCodec, dispatch_tx)
        .build()
        .expect("failed to build connection");

    let handler = tokio::spawn(async move {
        // The dispatch sender drops when the inbound stream ends, so this
        // loop terminates and releases the write handle.
        while let Some(request) = dispatch_rx.recv().await {
            let stream_id = request.stream_id();
            let body = request.into_body().unwrap_or_default();
            let response = ResponseMessage::new(stream_id)
                .with_headers(status_headers())
                .with_body(body);
            handle.write_response(response).await.expect("write failed");
        }
    });

    let frames = vec![
        headers_frame(1, false),
        data_frame(1, b"alpha", true),
        headers_frame(3, false),
        data_frame(3, b"beta", true),
    ];
    let mut sink: Vec<Frame> = Vec::new();
    connection
        .run(inbound(frames), &mut sink)
        .await
        .expect("driver failed");
    handler.await.expect("handler task panicked");

    assert_eq!(sink.len(), 4);
    assert!(matches!(
        &sink[0],
        Frame::Headers { stream_id, end_stream: false, .. } if *stream_id == StreamId::new(1)
    ));
    assert!(matches!(
        &sink[1],
        Frame::Data { payload, end_stream: true, .. } if payload.as_ref() == b"alpha"
    ));
    assert!(matches!(
        &sink[2],
        Frame::Headers { stream_id, end_stream: false, .. } if *stream_id == StreamId::new(3)
    ));
    assert!(matches!(
        &sink[3],
        Frame::Data { payload, end_stream: true, .. } if payload.as_ref() == b"beta"
    ));
}

#[tokio::test]
#[serial(connection_lifecycle)]
async fn concurrent_handlers_keep_responses_contiguous() {
    const STREAMS: u32 = 8;

    let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<RequestMessage<Bytes>>(16);
    let (connection, handle) = Connection::builder(RawBodyCodec, dispatch_tx)
        .build()
        .expect("failed to build connection");

    let handler = tokio::spawn(async move {
        let mut workers = Vec::new();
        while let Some(request) = dispatch_rx.recv().await {
            let handle = handle.clone();
            workers.push(tokio::spawn(async move {
                let stream_id = request.stream_id();
                let body = request.into_body().unwrap_or_default();
                let response = ResponseMessage::new(stream_id)
                    .with_headers(status_headers())
                    .with_body(body)
                    .with_trailers([("grpc-status", "0")].into_iter().collect::<HeaderMap>());
                handle.write_response(response).await.expect("write failed");
            }));
        }
        drop(handle);
        for worker in workers {
            worker.await.expect("worker task panicked");
        }
    });

    let mut frames = Vec::new();
    for stream in 0..STREAMS {
        frames.push(headers_frame(stream * 2 + 1, false));
    }
    for stream in (0..STREAMS).rev() {
        frames.push(data_frame(stream * 2 + 1, b"payload", true));
    }
    let mut sink: Vec<Frame> = Vec::new();
    connection
        .run(inbound(frames), &mut sink)
        .await
        .expect("driver failed");
    handler.await.expect("handler task panicked");

    assert_eq!(sink.len(), (STREAMS * 3) as usize);
    let mut seen = BTreeSet::new();
    for block in sink.chunks(3) {
        let ids: Vec<u32> = block
            .iter()
            .map(|frame| {
                frame
                    .stream_id()
                    .expect("response frames carry a stream id")
                    .as_u32()
            })
            .collect();
        assert_eq!(ids[0], ids[1], "response frames must stay contiguous");
        assert_eq!(ids[1], ids[2], "response frames must stay contiguous");
        assert!(seen.insert(ids[0]), "each stream answers exactly once");
    }
    let expected: BTreeSet<u32> = (0..STREAMS).map(|stream| stream * 2 + 1).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
#[serial(connection_lifecycle)]
async fn shutdown_reports_closed_to_late_writers() {
    let (dispatch_tx, _dispatch_rx) = mpsc::channel::<RequestMessage<Bytes>>(8);
    let token = CancellationToken::new();
    let (connection, handle) = Connection::builder(RawBodyCodec, dispatch_tx)
        .shutdown_token(token.clone())
        .build()
        .expect("failed to build connection");

    let driver = tokio::spawn(async move {
        let mut sink: Vec<Frame> = Vec::new();
        let result = connection
            .run(stream::pending::<std::io::Result<Frame>>(), &mut sink)
            .await;
        (result, sink)
    });

    token.cancel();
    let (result, sink) = driver.await.expect("driver task panicked");
    result.expect("driver failed");
    assert!(sink.is_empty());

    let error = handle
        .send_frame(Frame::Ping { payload: 1 })
        .await
        .expect_err("write after shutdown should fail");
    assert!(matches!(error, WriteError::Closed));
}

#[tokio::test]
#[serial(connection_lifecycle)]
async fn gauge_tracks_live_connections() {
    let baseline = open_connections();

    let (dispatch_tx, _dispatch_rx) = mpsc::channel::<RequestMessage<Bytes>>(1);
    let first = Connection::builder(RawBodyCodec, dispatch_tx.clone())
        .build()
        .expect("failed to build connection");
    let second = Connection::builder(RawBodyCodec, dispatch_tx)
        .build()
        .expect("failed to build connection");
    assert_eq!(open_connections(), baseline + 2);

    drop(first);
    assert_eq!(open_connections(), baseline + 1);
    drop(second);
    assert_eq!(open_connections(), baseline);
}
