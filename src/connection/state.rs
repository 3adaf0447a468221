//! Driver lifecycle state and the process-wide open-connection count.

use std::sync::atomic::{AtomicU64, Ordering};

static OPEN_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

/// Number of connections currently open in this process.
///
/// A connection counts from the moment it is built until its driver is
/// dropped, whether or not it was ever run.
#[must_use]
pub fn open_connections() -> u64 { OPEN_CONNECTIONS.load(Ordering::Relaxed) }

/// Internal run state for the connection driver.
pub(super) enum RunState {
    /// Both sources are open and frames are still flowing.
    Active,
    /// Shutdown was requested; the driver stops without draining.
    Cancelled,
    /// Both sources have completed and the driver can exit.
    Finished,
}

/// Tracks which of the driver's two sources remain open.
///
/// The inbound frame stream and the write command channel close
/// independently. The driver keeps running until both are exhausted or a
/// shutdown request short-circuits the loop.
///
/// Each `DriverState` also accounts for one open connection: creating it
/// raises [`open_connections`] and the metrics gauge, dropping it lowers
/// them again.
pub(super) struct DriverState {
    run_state: RunState,
    inbound_open: bool,
    writes_open: bool,
}

impl DriverState {
    pub(super) fn new() -> Self {
        OPEN_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
        crate::metrics::inc_connections();
        Self {
            run_state: RunState::Active,
            inbound_open: true,
            writes_open: true,
        }
    }

    /// Record that the inbound frame stream has ended.
    pub(super) fn mark_inbound_done(&mut self) {
        self.inbound_open = false;
        self.check_finished();
    }

    /// Record that every write handle has been dropped.
    pub(super) fn mark_writes_done(&mut self) {
        self.writes_open = false;
        self.check_finished();
    }

    /// Transition to `Cancelled` in response to a shutdown request.
    pub(super) fn cancel(&mut self) {
        if matches!(self.run_state, RunState::Active) {
            self.run_state = RunState::Cancelled;
        }
    }

    fn check_finished(&mut self) {
        if !self.inbound_open && !self.writes_open {
            self.run_state = RunState::Finished;
        }
    }

    /// Returns `true` while the driver is still processing sources.
    pub(super) fn is_active(&self) -> bool { matches!(self.run_state, RunState::Active) }

    /// Returns `true` while the inbound frame stream may yield more frames.
    pub(super) fn inbound_open(&self) -> bool { self.inbound_open }

    /// Returns `true` while write commands may still arrive.
    pub(super) fn writes_open(&self) -> bool { self.writes_open }

    /// Returns `true` once the driver should exit its loop.
    pub(super) fn is_done(&self) -> bool {
        !matches!(self.run_state, RunState::Active)
    }

    /// Returns `true` when the loop ended because shutdown was requested.
    pub(super) fn is_cancelled(&self) -> bool {
        matches!(self.run_state, RunState::Cancelled)
    }
}

impl Drop for DriverState {
    fn drop(&mut self) {
        OPEN_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
        crate::metrics::dec_connections();
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
