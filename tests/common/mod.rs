//! Shared utilities for integration tests.
//!
//! Provides frame constructors, a log capture, and a shared result type.
//! These helpers reduce duplication across test modules.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::sync::{Mutex, MutexGuard, OnceLock};

use bytes::Bytes;
use log::Level;
use logtest::Logger;
use muxwire::frame::{Frame, HeaderMap, StreamId};
use rstest::fixture;

/// Shared result type for integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Headers for a typical request stream.
pub fn request_headers() -> HeaderMap {
    [(":method", "POST"), (":path", "/echo")].into_iter().collect()
}

/// Build a headers frame for `stream` carrying [`request_headers`].
pub fn headers_frame(stream: u32, end_stream: bool) -> Frame {
    Frame::Headers {
        stream_id: StreamId::new(stream),
        headers: request_headers(),
        padding: 0,
        end_stream,
    }
}

/// Build an unpadded data frame for `stream`.
pub fn data_frame(stream: u32, payload: &'static [u8], end_stream: bool) -> Frame {
    Frame::Data {
        stream_id: StreamId::new(stream),
        payload: Bytes::from_static(payload),
        padding: 0,
        end_stream,
    }
}

/// Exclusive claim on the process-wide log capture.
///
/// `log` installs one global logger per process, so every test that
/// inspects records must take this claim and join the matching `#[serial]`
/// group. Acquiring discards records left behind by earlier tests.
pub struct LogCapture {
    records: MutexGuard<'static, Logger>,
}

impl LogCapture {
    /// Start (or reuse) the capture and empty its backlog.
    pub fn acquire() -> Self {
        static CAPTURE: OnceLock<Mutex<Logger>> = OnceLock::new();

        let capture = CAPTURE.get_or_init(|| Mutex::new(Logger::start()));
        let mut records = capture
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while records.pop().is_some() {}

        Self { records }
    }

    /// Pop every captured record, keeping those whose message contains
    /// `needle`.
    pub fn take_matching(&mut self, needle: &str) -> Vec<(Level, String)> {
        let mut matching = Vec::new();
        while let Some(record) = self.records.pop() {
            if record.args().contains(needle) {
                matching.push((record.level(), record.args().to_owned()));
            }
        }
        matching
    }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logs() -> LogCapture { LogCapture::acquire() }
