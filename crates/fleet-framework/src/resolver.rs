//! # Remote Resolver
//!
//! Looks up foreign-owned records by ID through a peer, behind a [`FailureGate`].
//!
//! Two entry points with different failure contracts:
//!
//! - [`RemoteResolver::lookup`] is for the write path. A peer that answered "not found" is
//!   `Ok(None)`; a peer that could not answer is `Err(ServiceError::RemoteUnavailable)`.
//! - [`RemoteResolver::resolve`] is for composition. It never fails: "absent" and "could not
//!   ask" both come back as `None` and only the log tells them apart.

use crate::client::ResourceClient;
use crate::entity::OwnedEntity;
use crate::error::{FrameworkError, ServiceError};
use crate::gate::FailureGate;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A failure talking to a peer. Never a "not found": that is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("undecodable response: {0}")]
    Decode(String),
    #[error("peer unavailable: {0}")]
    Unavailable(String),
}

/// The "resolve by ID" capability of a peer service (`GET /<resource>/{id}`).
///
/// Implemented by the in-process [`ResourceClient`] and by [`HttpPeer`](crate::HttpPeer), so
/// a resolver does not care where the owning service runs.
#[async_trait]
pub trait PeerLookup<Id, T>: Send + Sync {
    async fn fetch(&self, id: Id) -> Result<Option<T>, PeerError>;
}

#[async_trait]
impl<T: OwnedEntity> PeerLookup<T::Id, T> for ResourceClient<T> {
    async fn fetch(&self, id: T::Id) -> Result<Option<T>, PeerError> {
        self.get(id).await.map_err(|e| match e {
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                PeerError::Unavailable(e.to_string())
            }
            other => PeerError::Transport(other.to_string()),
        })
    }
}

/// Typed, gated lookup of one dependency.
pub struct RemoteResolver<Id, T> {
    dependency: String,
    peer: Arc<dyn PeerLookup<Id, T>>,
    gate: Arc<FailureGate>,
}

impl<Id, T> Clone for RemoteResolver<Id, T> {
    fn clone(&self) -> Self {
        Self {
            dependency: self.dependency.clone(),
            peer: self.peer.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<Id, T> std::fmt::Debug for RemoteResolver<Id, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResolver")
            .field("dependency", &self.dependency)
            .field("gate", &self.gate.name())
            .finish()
    }
}

impl<Id, T> RemoteResolver<Id, T>
where
    Id: Display + Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new(
        dependency: impl Into<String>,
        peer: Arc<dyn PeerLookup<Id, T>>,
        gate: Arc<FailureGate>,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            peer,
            gate,
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn gate(&self) -> &Arc<FailureGate> {
        &self.gate
    }

    /// Strict lookup for the write path.
    pub async fn lookup(&self, id: Id) -> Result<Option<T>, ServiceError> {
        debug!(dependency = %self.dependency, %id, "Lookup");
        let peer = &self.peer;
        self.gate
            .execute(|| peer.fetch(id))
            .await
            .map_err(|e| ServiceError::remote(&self.dependency, e))
    }

    /// Best-effort lookup for composition. Never fails.
    pub async fn resolve(&self, id: Id) -> Option<T> {
        match self.lookup(id.clone()).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                info!(dependency = %self.dependency, %id, "Reference not found, leaving it out");
                None
            }
            Err(e) => {
                warn!(dependency = %self.dependency, %id, error = %e, "Resolution failed, leaving it out");
                None
            }
        }
    }

    pub async fn resolve_opt(&self, id: Option<Id>) -> Option<T> {
        match id {
            Some(id) => self.resolve(id).await,
            None => None,
        }
    }

    /// Resolves `ids` concurrently and keeps what resolved, in input order.
    pub async fn resolve_all(&self, ids: impl IntoIterator<Item = Id>) -> Vec<T> {
        futures::future::join_all(ids.into_iter().map(|id| self.resolve(id)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{BreakerState, GateConfig};
    use crate::testing::{Note, NoteCreate, NoteId};
    use crate::ResourceActor;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct DownPeer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PeerLookup<NoteId, Note> for DownPeer {
        async fn fetch(&self, _id: NoteId) -> Result<Option<Note>, PeerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PeerError::Transport("connection refused".into()))
        }
    }

    fn gate() -> Arc<FailureGate> {
        Arc::new(FailureGate::new(
            "test->notes",
            GateConfig {
                failure_threshold: 2,
                failure_rate: 0.5,
                window_ms: 60_000,
                cooldown_ms: 60_000,
                half_open_max_calls: 1,
                call_timeout_ms: 500,
            },
        ))
    }

    #[tokio::test]
    async fn resolves_through_an_in_process_actor() {
        let (actor, client) = ResourceActor::<Note>::new(8);
        tokio::spawn(actor.run(()));
        let id = client.create(NoteCreate { text: "hello".into() }).await.unwrap();

        let resolver = RemoteResolver::new("notes", Arc::new(client), gate());
        assert_eq!(resolver.resolve(id).await.map(|n| n.text), Some("hello".into()));
        assert!(resolver.resolve(NoteId(99)).await.is_none());
        assert_eq!(resolver.lookup(NoteId(99)).await, Ok(None));
    }

    #[tokio::test]
    async fn lookup_escalates_and_resolve_absorbs() {
        let peer = Arc::new(DownPeer { calls: AtomicU32::new(0) });
        let resolver = RemoteResolver::new("notes", peer.clone(), gate());

        let strict = resolver.lookup(NoteId(1)).await;
        assert!(matches!(strict, Err(ServiceError::RemoteUnavailable { ref dependency, .. }) if dependency == "notes"));
        assert!(resolver.resolve(NoteId(1)).await.is_none());
        assert_eq!(resolver.gate().state(), BreakerState::Open);

        // breaker open: no further calls reach the peer
        assert!(resolver.resolve(NoteId(1)).await.is_none());
        assert_eq!(peer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resolve_all_drops_unresolved_ids() {
        let (actor, client) = ResourceActor::<Note>::new(8);
        tokio::spawn(actor.run(()));
        let a = client.create(NoteCreate { text: "a".into() }).await.unwrap();
        let b = client.create(NoteCreate { text: "b".into() }).await.unwrap();

        let resolver = RemoteResolver::new("notes", Arc::new(client), gate());
        let found = resolver.resolve_all([a, NoteId(42), b]).await;
        let texts: Vec<_> = found.into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
