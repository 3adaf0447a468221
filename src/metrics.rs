//! Metric helpers for `muxwire`.
//!
//! This module defines metric names and simple helper functions wrapping
//! the [`metrics`](https://docs.rs/metrics) crate. With the `metrics`
//! feature disabled the helpers compile to no-ops so call sites stay
//! unconditional.

/// Name of the gauge tracking active connections.
pub const CONNECTIONS_ACTIVE: &str = "muxwire_connections_active";
/// Name of the counter tracking frames by direction.
pub const FRAMES_TOTAL: &str = "muxwire_frames_total";
/// Name of the counter tracking fully assembled requests.
pub const REQUESTS_ASSEMBLED_TOTAL: &str = "muxwire_requests_assembled_total";
/// Name of the counter tracking condemned streams.
pub const STREAM_ERRORS_TOTAL: &str = "muxwire_stream_errors_total";

/// Direction of frame processing.
#[derive(Clone, Copy)]
pub enum Direction {
    /// Inbound frames received from a peer.
    Inbound,
    /// Outbound frames sent to a peer.
    Outbound,
}

#[cfg(feature = "metrics")]
impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active connections gauge.
#[cfg(feature = "metrics")]
pub fn inc_connections() { metrics::gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Decrement the active connections gauge.
#[cfg(feature = "metrics")]
pub fn dec_connections() { metrics::gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Record a frame processed in the given direction.
#[cfg(feature = "metrics")]
pub fn inc_frames(direction: Direction) {
    metrics::counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
}

/// Record a request assembled from a completed stream.
#[cfg(feature = "metrics")]
pub fn inc_requests_assembled() {
    metrics::counter!(REQUESTS_ASSEMBLED_TOTAL).increment(1);
}

/// Record a stream condemned by a decode failure.
#[cfg(feature = "metrics")]
pub fn inc_stream_errors() { metrics::counter!(STREAM_ERRORS_TOTAL).increment(1); }

/// Increment the active connections gauge.
#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

/// Decrement the active connections gauge.
#[cfg(not(feature = "metrics"))]
pub fn dec_connections() {}

/// Record a frame processed in the given direction.
#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_direction: Direction) {}

/// Record a request assembled from a completed stream.
#[cfg(not(feature = "metrics"))]
pub fn inc_requests_assembled() {}

/// Record a stream condemned by a decode failure.
#[cfg(not(feature = "metrics"))]
pub fn inc_stream_errors() {}
