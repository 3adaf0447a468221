//! Per-connection cache of headers awaiting their stream's end.

use std::collections::HashMap;

use crate::frame::{HeaderMap, StreamId};

/// Header sets received before their stream completed.
///
/// At most one set is pending per stream; a later header block for the same
/// stream replaces the earlier one. Entries are removed exactly when the
/// stream completes or resets, so a long-lived connection cannot accumulate
/// state for streams that already finished.
///
/// The cache is owned by one connection's listener and is only touched from
/// that connection's processing task, so it needs no synchronisation.
#[derive(Debug, Default)]
pub struct StreamHeaderCache {
    pending: HashMap<StreamId, HeaderMap>,
}

impl StreamHeaderCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Store headers for `stream_id`, returning any replaced set.
    pub fn insert(&mut self, stream_id: StreamId, headers: HeaderMap) -> Option<HeaderMap> {
        self.pending.insert(stream_id, headers)
    }

    /// Look at the pending headers for `stream_id` without removing them.
    #[must_use]
    pub fn get(&self, stream_id: StreamId) -> Option<&HeaderMap> {
        self.pending.get(&stream_id)
    }

    /// Remove and return the pending headers for `stream_id`.
    pub fn take(&mut self, stream_id: StreamId) -> Option<HeaderMap> {
        self.pending.remove(&stream_id)
    }

    /// Discard any pending headers for `stream_id`.
    ///
    /// Returns true when an entry was discarded.
    pub fn remove(&mut self, stream_id: StreamId) -> bool {
        self.pending.remove(&stream_id).is_some()
    }

    /// Number of streams with pending headers.
    #[must_use]
    pub fn len(&self) -> usize { self.pending.len() }

    /// True when no stream has pending headers.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.pending.is_empty() }
}

#[cfg(test)]
#[path = "header_cache_tests.rs"]
mod tests;
