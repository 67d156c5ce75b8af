//! # Cascade Coordinator
//!
//! Runs from an entity's `on_delete` hook, before the record leaves its store. Every registered
//! dependent relation gets a policy:
//!
//! - [`CascadePolicy::Detach`]: clear the reference on every dependent (persisted by the
//!   dependent's own service), then confirm none is left.
//! - [`CascadePolicy::Restrict`]: refuse the delete while dependents exist.
//!
//! Either way a delete that still has dependents fails with a `Conflict` ("delete dependents
//! first"), which the caller can fix. Restrictions are checked before anything is detached, so
//! a refused delete leaves dependents untouched.

use crate::client::ResourceClient;
use crate::entity::OwnedEntity;
use crate::error::{FrameworkError, ServiceError};
use crate::gate::{FailureGate, GateError};
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePolicy {
    Detach,
    Restrict,
}

/// A store holding records that reference a `TargetId`.
#[async_trait]
pub trait DependentStore<TargetId>: Send + Sync {
    /// Name of the dependent relation, for messages (`"registration"`).
    fn relation(&self) -> &str;

    /// How many dependents reference `target`.
    async fn referencing(&self, target: &TargetId) -> Result<usize, ServiceError>;

    /// Clears the reference on every dependent; returns how many were rewritten.
    async fn detach(&self, target: &TargetId) -> Result<usize, ServiceError>;
}

/// [`DependentStore`] over a peer's resource actor, reached through a gate.
///
/// `filter` selects the dependents of a target; `clear` is the action that nulls the reference
/// on one dependent. A field built with [`ReferenceField::counting`] has no `clear` and only
/// suits [`CascadeCoordinator::restrict`].
pub struct ReferenceField<T: OwnedEntity, TargetId> {
    relation: String,
    client: ResourceClient<T>,
    gate: Arc<FailureGate>,
    filter: fn(&TargetId) -> T::Filter,
    clear: Option<fn(&TargetId) -> T::Action>,
}

impl<T: OwnedEntity, TargetId> ReferenceField<T, TargetId> {
    pub fn new(
        relation: impl Into<String>,
        client: ResourceClient<T>,
        gate: Arc<FailureGate>,
        filter: fn(&TargetId) -> T::Filter,
        clear: fn(&TargetId) -> T::Action,
    ) -> Self {
        Self {
            relation: relation.into(),
            client,
            gate,
            filter,
            clear: Some(clear),
        }
    }

    pub fn counting(
        relation: impl Into<String>,
        client: ResourceClient<T>,
        gate: Arc<FailureGate>,
        filter: fn(&TargetId) -> T::Filter,
    ) -> Self {
        Self {
            relation: relation.into(),
            client,
            gate,
            filter,
            clear: None,
        }
    }

    fn unavailable(&self, error: GateError<FrameworkError>) -> ServiceError {
        match error {
            GateError::Inner(FrameworkError::Service(inner)) => inner,
            other => ServiceError::remote(&self.relation, other),
        }
    }
}

#[async_trait]
impl<T, TargetId> DependentStore<TargetId> for ReferenceField<T, TargetId>
where
    T: OwnedEntity,
    TargetId: Display + Send + Sync + 'static,
{
    fn relation(&self) -> &str {
        &self.relation
    }

    async fn referencing(&self, target: &TargetId) -> Result<usize, ServiceError> {
        let filter = (self.filter)(target);
        let found = self
            .gate
            .execute(|| self.client.list(Some(filter)))
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(found.len())
    }

    async fn detach(&self, target: &TargetId) -> Result<usize, ServiceError> {
        let Some(clear) = self.clear else {
            return Ok(0);
        };
        let filter = (self.filter)(target);
        let dependents = self
            .gate
            .execute(|| self.client.list(Some(filter)))
            .await
            .map_err(|e| self.unavailable(e))?;

        let mut rewritten = 0;
        for dependent in dependents {
            let id = dependent.id().clone();
            let action = clear(target);
            match self
                .gate
                .execute(|| self.client.perform_action(id.clone(), action))
                .await
            {
                Ok(_) => rewritten += 1,
                // deleted concurrently: nothing left to detach
                Err(GateError::Inner(FrameworkError::NotFound(_))) => {}
                Err(e) => {
                    warn!(relation = %self.relation, %id, %target, error = %e, "Detach failed");
                    return Err(self.unavailable(e));
                }
            }
        }
        Ok(rewritten)
    }
}

/// Outcome of a successful [`CascadeCoordinator::before_delete`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub detached: usize,
}

/// Ordered list of dependent relations of one entity type.
pub struct CascadeCoordinator<TargetId> {
    entity: &'static str,
    relations: Vec<(CascadePolicy, Arc<dyn DependentStore<TargetId>>)>,
}

impl<TargetId> Clone for CascadeCoordinator<TargetId> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            relations: self.relations.clone(),
        }
    }
}

impl<TargetId: Display + Send + Sync> CascadeCoordinator<TargetId> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn detach(mut self, store: Arc<dyn DependentStore<TargetId>>) -> Self {
        self.relations.push((CascadePolicy::Detach, store));
        self
    }

    #[must_use]
    pub fn restrict(mut self, store: Arc<dyn DependentStore<TargetId>>) -> Self {
        self.relations.push((CascadePolicy::Restrict, store));
        self
    }

    fn blocked(&self, target: &TargetId, relation: &str, count: usize) -> ServiceError {
        ServiceError::Conflict(format!(
            "{} {} is still referenced by {} {}(s); delete dependents first",
            self.entity, target, count, relation
        ))
    }

    /// Clears or checks every dependent relation of `target`. `Ok` means the delete may go on.
    pub async fn before_delete(&self, target: &TargetId) -> Result<CascadeReport, ServiceError> {
        for (_, store) in self
            .relations
            .iter()
            .filter(|(policy, _)| *policy == CascadePolicy::Restrict)
        {
            let count = store.referencing(target).await?;
            if count > 0 {
                warn!(entity = self.entity, %target, relation = store.relation(), count, "Delete restricted");
                return Err(self.blocked(target, store.relation(), count));
            }
        }

        let mut report = CascadeReport::default();
        for (_, store) in self
            .relations
            .iter()
            .filter(|(policy, _)| *policy == CascadePolicy::Detach)
        {
            report.detached += store.detach(target).await?;
            let left = store.referencing(target).await?;
            if left > 0 {
                warn!(entity = self.entity, %target, relation = store.relation(), left, "Dependents remain after detach");
                return Err(self.blocked(target, store.relation(), left));
            }
        }

        info!(entity = self.entity, %target, detached = report.detached, "Cascade done");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateConfig;
    use crate::testing::{Note, NoteAction, NoteCreate};
    use crate::ResourceActor;

    fn tagged_notes(client: &ResourceClient<Note>) -> Arc<dyn DependentStore<u32>> {
        Arc::new(ReferenceField::new(
            "note",
            client.clone(),
            Arc::new(FailureGate::new("topics->notes", GateConfig::default())),
            |topic: &u32| *topic,
            |_: &u32| NoteAction::Untag,
        ))
    }

    async fn notes_on_topic(count: usize, topic: u32) -> ResourceClient<Note> {
        let (actor, client) = ResourceActor::<Note>::new(16);
        tokio::spawn(actor.run(()));
        for i in 0..count {
            let id = client.create(NoteCreate { text: format!("n{i}") }).await.unwrap();
            client.perform_action(id, NoteAction::Tag(topic)).await.unwrap();
        }
        client
    }

    #[tokio::test]
    async fn detach_clears_every_dependent() {
        let client = notes_on_topic(3, 7).await;
        let cascade = CascadeCoordinator::new("topic").detach(tagged_notes(&client));

        let report = cascade.before_delete(&7).await.unwrap();
        assert_eq!(report.detached, 3);
        assert!(client.list(Some(7)).await.unwrap().is_empty());
        assert_eq!(client.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn restrict_refuses_and_leaves_dependents_alone() {
        let client = notes_on_topic(2, 4).await;
        let cascade = CascadeCoordinator::new("topic")
            .restrict(tagged_notes(&client))
            .detach(tagged_notes(&client));

        let err = cascade.before_delete(&4).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("delete dependents first")));
        assert_eq!(client.list(Some(4)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn nothing_to_do_without_dependents() {
        let client = notes_on_topic(1, 1).await;
        let cascade = CascadeCoordinator::new("topic").restrict(tagged_notes(&client));
        assert_eq!(cascade.before_delete(&2).await, Ok(CascadeReport::default()));
    }

    #[tokio::test]
    async fn counting_field_leaves_dependents_in_place() {
        let client = notes_on_topic(1, 5).await;
        let counted: Arc<dyn DependentStore<u32>> = Arc::new(ReferenceField::counting(
            "note",
            client.clone(),
            Arc::new(FailureGate::new("topics->notes", GateConfig::default())),
            |topic: &u32| *topic,
        ));
        let err = CascadeCoordinator::new("topic")
            .detach(counted)
            .before_delete(&5)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Conflict("topic 5 is still referenced by 1 note(s); delete dependents first".into())
        );
    }

    #[tokio::test]
    async fn stopped_dependent_service_is_remote_unavailable() {
        let client = notes_on_topic(1, 1).await;
        client.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        let cascade = CascadeCoordinator::new("topic").detach(tagged_notes(&client));
        let err = cascade.before_delete(&1).await.unwrap_err();
        assert!(!err.is_client_fixable());
    }
}
