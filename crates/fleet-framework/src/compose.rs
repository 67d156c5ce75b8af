//! # Composition
//!
//! A composed view is an owned record plus best-effort snapshots of what it references.
//! [`Compose::compose`] resolves the references through
//! [`RemoteResolver::resolve`](crate::RemoteResolver::resolve), so a degraded peer yields a
//! missing field and never a failed view. Redaction runs afterwards, over the finished view.

use crate::auth::AuthContext;
use async_trait::async_trait;

/// Strips what `auth` may not see. Pure: no I/O, no failure.
pub trait Redact {
    #[must_use]
    fn redact(self, auth: &AuthContext) -> Self;
}

#[async_trait]
pub trait Compose: Send + Sync + Sized {
    type View: Send;
    /// Resolvers for the peers this view draws on.
    type Peers: Send + Sync;

    async fn compose(self, peers: &Self::Peers) -> Self::View;
}

/// Composes one record and redacts the result for `auth`.
pub async fn compose_for<T>(item: T, peers: &T::Peers, auth: &AuthContext) -> T::View
where
    T: Compose,
    T::View: Redact,
{
    item.compose(peers).await.redact(auth)
}

/// Composes many records concurrently, keeping their order.
pub async fn compose_all<T>(items: Vec<T>, peers: &T::Peers, auth: &AuthContext) -> Vec<T::View>
where
    T: Compose,
    T::View: Redact,
{
    futures::future::join_all(items.into_iter().map(|item| compose_for(item, peers, auth))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Capability, Role};
    use crate::gate::{FailureGate, GateConfig};
    use crate::resolver::{PeerError, PeerLookup, RemoteResolver};
    use crate::testing::{Note, NoteCreate, NoteId};
    use crate::ResourceActor;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Comment {
        body: String,
        note: NoteId,
    }

    #[derive(Debug)]
    struct CommentView {
        body: Option<String>,
        note: Option<Note>,
    }

    impl Redact for CommentView {
        fn redact(mut self, auth: &AuthContext) -> Self {
            if !auth.can(Capability::ViewSensitive) {
                self.body = None;
            }
            self
        }
    }

    #[async_trait]
    impl Compose for Comment {
        type View = CommentView;
        type Peers = RemoteResolver<NoteId, Note>;

        async fn compose(self, notes: &Self::Peers) -> CommentView {
            CommentView {
                body: Some(self.body),
                note: notes.resolve(self.note).await,
            }
        }
    }

    struct Down;

    #[async_trait]
    impl PeerLookup<NoteId, Note> for Down {
        async fn fetch(&self, _: NoteId) -> Result<Option<Note>, PeerError> {
            Err(PeerError::Unavailable("down".into()))
        }
    }

    fn gate() -> Arc<FailureGate> {
        Arc::new(FailureGate::new("comments->notes", GateConfig::default()))
    }

    #[tokio::test]
    async fn composes_and_redacts_after() {
        let (actor, client) = ResourceActor::<Note>::new(8);
        tokio::spawn(actor.run(()));
        let note = client.create(NoteCreate { text: "n".into() }).await.unwrap();
        let notes = RemoteResolver::new("notes", Arc::new(client), gate());

        let comment = Comment {
            body: "secret".into(),
            note,
        };
        let staff = compose_for(comment.clone(), &notes, &AuthContext::new(1, Role::Doctor)).await;
        assert_eq!(staff.body.as_deref(), Some("secret"));
        assert!(staff.note.is_some());

        let client_view = compose_for(comment, &notes, &AuthContext::new(2, Role::Client)).await;
        assert!(client_view.body.is_none());
        assert!(client_view.note.is_some());
    }

    #[tokio::test]
    async fn degraded_peer_leaves_the_field_out() {
        let notes = RemoteResolver::new("notes", Arc::new(Down), gate());
        let views = compose_all(
            vec![
                Comment { body: "a".into(), note: NoteId(1) },
                Comment { body: "b".into(), note: NoteId(2) },
            ],
            &notes,
            &AuthContext::admin(),
        )
        .await;
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.note.is_none()));
        assert_eq!(views[1].body.as_deref(), Some("b"));
    }
}
