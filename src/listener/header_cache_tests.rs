//! Unit tests for the stream header cache.

use rstest::{fixture, rstest};

use super::StreamHeaderCache;
use crate::frame::{HeaderMap, StreamId};

fn headers(path: &str) -> HeaderMap { [(":path", path)].into_iter().collect() }

#[fixture]
fn cache() -> StreamHeaderCache { StreamHeaderCache::new() }

#[rstest]
fn insert_then_take_round_trips(mut cache: StreamHeaderCache) {
    assert!(cache.insert(StreamId::new(3), headers("/a")).is_none());
    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(StreamId::new(3)).and_then(HeaderMap::path),
        Some("/a"),
    );

    let taken = cache.take(StreamId::new(3)).expect("entry should exist");
    assert_eq!(taken.path(), Some("/a"));
    assert!(cache.is_empty());
    assert!(cache.take(StreamId::new(3)).is_none());
}

#[rstest]
fn later_insert_replaces_pending_entry(mut cache: StreamHeaderCache) {
    cache.insert(StreamId::new(5), headers("/old"));
    let replaced = cache
        .insert(StreamId::new(5), headers("/new"))
        .expect("first set should be returned");
    assert_eq!(replaced.path(), Some("/old"));
    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(StreamId::new(5)).and_then(HeaderMap::path),
        Some("/new"),
    );
}

#[rstest]
fn remove_discards_only_the_named_stream(mut cache: StreamHeaderCache) {
    cache.insert(StreamId::new(1), headers("/a"));
    cache.insert(StreamId::new(3), headers("/b"));

    assert!(cache.remove(StreamId::new(1)));
    assert!(!cache.remove(StreamId::new(1)));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(StreamId::new(1)).is_none());
    assert!(cache.get(StreamId::new(3)).is_some());
}

#[rstest]
fn streams_are_independent(mut cache: StreamHeaderCache) {
    for id in [1_u32, 3, 5, 7] {
        cache.insert(StreamId::new(id), headers(&format!("/{id}")));
    }
    assert_eq!(cache.len(), 4);
    cache.take(StreamId::new(5));
    assert_eq!(cache.len(), 3);
    for id in [1_u32, 3, 7] {
        assert!(cache.get(StreamId::new(id)).is_some(), "stream {id} lost");
    }
}
