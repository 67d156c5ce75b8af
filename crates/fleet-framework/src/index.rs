//! # Index Upkeep
//!
//! A service that owns one side of an association keeps the other side's ID set current with
//! explicit actions on the peer ("add doctor 7 to department 2"). The owning write is already
//! committed when this runs, so a failed second step is logged and the peer's index lags until
//! the next successful update.

use crate::client::ResourceClient;
use crate::entity::OwnedEntity;
use crate::gate::FailureGate;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gated handle to the peer store holding the index.
pub struct IndexLink<T: OwnedEntity> {
    relation: String,
    client: ResourceClient<T>,
    gate: Arc<FailureGate>,
}

impl<T: OwnedEntity> Clone for IndexLink<T> {
    fn clone(&self) -> Self {
        Self {
            relation: self.relation.clone(),
            client: self.client.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<T: OwnedEntity> IndexLink<T> {
    pub fn new(relation: impl Into<String>, client: ResourceClient<T>, gate: Arc<FailureGate>) -> Self {
        Self {
            relation: relation.into(),
            client,
            gate,
        }
    }

    /// Runs `action` on record `id` of the peer. Returns whether the peer applied it.
    pub async fn apply(&self, id: T::Id, action: T::Action) -> bool {
        debug!(relation = %self.relation, %id, ?action, "Index upkeep");
        match self
            .gate
            .execute(|| self.client.perform_action(id.clone(), action))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(relation = %self.relation, %id, error = %e, "Index upkeep failed, index lags behind");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateConfig;
    use crate::testing::{NoteAction, NoteCreate, NoteId};
    use crate::ResourceActor;

    fn gate() -> Arc<FailureGate> {
        Arc::new(FailureGate::new("topics->notes", GateConfig::default()))
    }

    #[tokio::test]
    async fn applies_the_action_on_the_peer() {
        let (actor, notes) = ResourceActor::new(8);
        tokio::spawn(actor.run(()));
        let id = notes.create(NoteCreate { text: "a".into() }).await.unwrap();

        let link = IndexLink::new("note", notes.clone(), gate());
        assert!(link.apply(id, NoteAction::Tag(3)).await);
        assert_eq!(notes.get(id).await.unwrap().unwrap().topic, Some(3));
    }

    #[tokio::test]
    async fn missing_record_or_stopped_peer_is_swallowed() {
        let (actor, notes) = ResourceActor::new(8);
        tokio::spawn(actor.run(()));
        let link = IndexLink::new("note", notes.clone(), gate());
        assert!(!link.apply(NoteId(5), NoteAction::Untag).await);

        notes.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!link.apply(NoteId(1), NoteAction::Untag).await);
    }
}
