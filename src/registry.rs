//! Routing of responses back to live connections.
//!
//! Dispatch tasks receive requests from many connections over one channel,
//! so a response carries only a [`ConnectionId`] by the time it is ready.
//! A [`ConnectionRegistry`] closes that loop: connections enrol themselves
//! when built (see
//! [`ConnectionBuilder::registry`](crate::connection::ConnectionBuilder::registry))
//! and their entry is withdrawn when the driver stops, so
//! [`respond`](ConnectionRegistry::respond) can deliver by id alone.
//! Entries are `Weak`: the registry never keeps a finished connection's
//! write path alive, and a stale entry is cleared on the next lookup or
//! sweep.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::{
    codec::BodyCodec,
    connection::ConnectionId,
    error::WriteError,
    message::ResponseMessage,
    writer::{WriteHandle, WriteHandleInner},
};

/// Shared map from connection id to that connection's write path.
///
/// Clones are cheap and all observe the same entries.
pub struct ConnectionRegistry<C: BodyCodec> {
    entries: Arc<DashMap<ConnectionId, Weak<WriteHandleInner<C>>>>,
}

impl<C: BodyCodec> Clone for ConnectionRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<C: BodyCodec> Default for ConnectionRegistry<C> {
    fn default() -> Self { Self::new() }
}

impl<C: BodyCodec> ConnectionRegistry<C> {
    /// Create a registry with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Record the write path of a newly built connection.
    ///
    /// Returns the guard the connection driver holds; dropping it
    /// withdraws the entry.
    pub(crate) fn enrol(&self, id: ConnectionId, handle: &WriteHandle<C>) -> Enrolment<C> {
        let path = handle.downgrade();
        self.entries.insert(id, path.clone());
        Enrolment {
            registry: self.clone(),
            id,
            path,
        }
    }

    /// Look up the write handle enrolled for `id`.
    ///
    /// Returns `None` when the id was never enrolled, its driver has
    /// stopped, or every handle to it has been dropped; a stale entry
    /// found this way is cleared.
    #[must_use]
    pub fn lookup(&self, id: ConnectionId) -> Option<WriteHandle<C>> {
        let upgraded = self
            .entries
            .get(&id)
            .and_then(|entry| entry.value().upgrade());
        match upgraded {
            Some(inner) => Some(WriteHandle::from_arc(inner)),
            None => {
                self.entries
                    .remove_if(&id, |_, path| path.strong_count() == 0);
                None
            }
        }
    }

    /// Deliver `response` to the connection enrolled as `id`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::UnknownConnection`] when `id` has no live
    /// entry, and otherwise propagates any
    /// [`write_response`](WriteHandle::write_response) failure.
    pub async fn respond(
        &self,
        id: ConnectionId,
        response: ResponseMessage<C::Body>,
    ) -> Result<(), WriteError> {
        let handle = self
            .lookup(id)
            .ok_or(WriteError::UnknownConnection(id))?;
        handle.write_response(response).await
    }

    /// Ids of the connections that can currently accept writes.
    ///
    /// Stale entries encountered along the way are cleared.
    #[must_use]
    pub fn live_ids(&self) -> Vec<ConnectionId> {
        let mut ids = Vec::with_capacity(self.entries.len());
        self.entries.retain(|id, path| {
            let live = path.strong_count() > 0;
            if live {
                ids.push(*id);
            }
            live
        });
        ids
    }

    /// Clear every entry whose connection can no longer accept writes.
    ///
    /// `DashMap::retain` takes per-bucket write locks, so concurrent
    /// lookups may contend briefly while the sweep runs.
    pub fn sweep(&self) {
        self.entries.retain(|_, path| path.strong_count() > 0);
    }

    /// Number of entries, counting any stale ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` when no connection is enrolled.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Withdraws a connection's registry entry when its driver stops.
pub(crate) struct Enrolment<C: BodyCodec> {
    registry: ConnectionRegistry<C>,
    id: ConnectionId,
    path: Weak<WriteHandleInner<C>>,
}

impl<C: BodyCodec> Drop for Enrolment<C> {
    fn drop(&mut self) {
        // A later connection may have been enrolled under the same id;
        // withdraw the entry only if it is still ours.
        self.registry
            .entries
            .remove_if(&self.id, |_, path| path.ptr_eq(&self.path));
    }
}
