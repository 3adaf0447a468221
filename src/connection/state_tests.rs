//! Unit tests for driver lifecycle state tracking.

use super::DriverState;

#[test]
fn fresh_state_is_active_with_both_sources_open() {
    let state = DriverState::new();
    assert!(state.is_active());
    assert!(state.inbound_open());
    assert!(state.writes_open());
    assert!(!state.is_done());
}

#[test]
fn closing_one_source_keeps_the_driver_running() {
    let mut state = DriverState::new();
    state.mark_inbound_done();
    assert!(state.is_active());
    assert!(!state.inbound_open());
    assert!(state.writes_open());
}

#[test]
fn closing_both_sources_finishes_the_driver() {
    let mut state = DriverState::new();
    state.mark_inbound_done();
    state.mark_writes_done();
    assert!(state.is_done());
    assert!(!state.is_cancelled());
}

#[test]
fn cancellation_short_circuits_open_sources() {
    let mut state = DriverState::new();
    state.cancel();
    assert!(state.is_done());
    assert!(state.is_cancelled());
    assert!(state.inbound_open());
}

#[test]
fn cancel_after_finish_keeps_the_finished_state() {
    let mut state = DriverState::new();
    state.mark_inbound_done();
    state.mark_writes_done();
    state.cancel();
    assert!(state.is_done());
    assert!(!state.is_cancelled());
}
