//! # Tree Handles and Session Lifecycle
//! `Tree<B, V, Id>` is the user-facing handle to a backend: construct it
//! once, then open as many scoped sessions as needed. A reader session
//! (`will_update = false`) shares the backend with other readers; an update
//! session is exclusive. The permit backing a session is held for the
//! session's whole lifetime and released on `Drop` or on `finish`.

use crate::backend::{NodeId, ProviderSession};
use crate::engine::TreeSession;
use async_trait::async_trait;
use std::marker::PhantomData;

/// A constructible, session-opening backend. Implemented once per storage
/// backend (see `memory::MemoryBackend`); the engine only ever sees the
/// `ProviderSession` it opens.
#[async_trait]
pub trait Backend<V, Id>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
    Id: NodeId,
{
    type Session: ProviderSession<V, Id>;

    /// Opens a reader (`will_update = false`) or update (`will_update =
    /// true`) session, acquiring whatever exclusivity the backend needs for
    /// the session's whole lifetime.
    async fn begin_session(&self, will_update: bool) -> Self::Session;
}

/// A handle to a backend instance. Cheap to hold onto; all the actual state
/// lives behind the backend and is reached only through sessions.
pub struct Tree<B, V, Id>
where
    B: Backend<V, Id>,
    V: Clone + Send + Sync + 'static,
    Id: NodeId,
{
    backend: B,
    _marker: PhantomData<fn() -> (V, Id)>,
}

impl<B, V, Id> Tree<B, V, Id>
where
    B: Backend<V, Id>,
    V: Clone + Send + Sync + 'static,
    Id: NodeId,
{
    /// Wraps an already-constructed backend. Building the backend itself
    /// (opening a file, connecting to a store, ...) is the backend's own
    /// business, not this crate's.
    pub fn open(backend: B) -> Tree<B, V, Id> {
        Tree {
            backend,
            _marker: PhantomData,
        }
    }

    /// Opens a new session against the backend.
    pub async fn begin_session(&self, will_update: bool) -> TreeSession<B::Session, V, Id> {
        let session = self.backend.begin_session(will_update).await;
        log::debug!(
            "opened {} session",
            if will_update { "update" } else { "reader" }
        );
        TreeSession::new(session)
    }

    /// Borrows the underlying backend, e.g. to construct another `Tree`
    /// handle that shares it.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
