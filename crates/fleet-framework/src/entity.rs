//! # OwnedEntity Trait
//!
//! The `OwnedEntity` trait is the contract every record a service stores authoritatively
//! (Client, Employee, Duty, Registration, …) must implement to be managed by the generic
//! [`ResourceActor`](crate::ResourceActor). It names the ID, the creation DTO, the partial
//! update (patch) document, the list filter and the entity-specific actions, and provides the
//! lifecycle hooks the actor calls.
//!
//! # Provided Methods (Hooks)
//! - [`OwnedEntity::on_create`]
//! - [`OwnedEntity::on_delete`]
//! - [`OwnedEntity::unique_key`]
//! - [`OwnedEntity::matches`]
//! - [`OwnedEntity::check_local`], [`OwnedEntity::check_delete`]
//! - [`OwnedEntity::after_create`], [`OwnedEntity::after_update`], [`OwnedEntity::after_delete`]
//!
//! The defaults do nothing, have no unique key, and match every filter.
//!
//! # Mutation contract
//! `on_update` and `handle_action` receive a *copy* of the stored record. The actor swaps the
//! copy in only when the hook returns `Ok` and the unique key does not collide, so a hook may
//! merge a patch first and validate afterwards without ever leaving a half-applied record.

use crate::error::ServiceError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

/// Trait that any service-owned record must implement to be managed by ResourceActor.
///
/// # Async & Context
/// Hooks are async so they can call peer services. The `Context` type (peer resolvers,
/// cascade coordinators, gates) is injected once at `run()` time.
#[async_trait]
pub trait OwnedEntity: Clone + Send + Sync + 'static {
    /// Opaque numeric identity, assigned by the actor on creation.
    type Id: Ord + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// Partial update document; `None` fields leave the stored value untouched.
    type Patch: Send + Sync + Debug;

    /// Query used by `List` (`GET /<resource>?<field>=<value>`).
    type Filter: Send + Sync + Debug;

    /// Enum representing entity-specific operations (status toggles, detaching references).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    fn id(&self) -> &Self::Id;

    /// Construct the full entity from the generated ID and the payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, ServiceError>;

    /// Value that must be unique across the store (e.g. `"email a@b.com"`).
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn matches(&self, _filter: &Self::Filter) -> bool {
        true
    }

    /// Checks references to other records of the same store (a team of doctors held by a
    /// manager). Runs after `on_create` / `on_update`; `previous` is the stored version on
    /// update and `None` on create. On update, `store` still holds `previous` under the
    /// candidate's own ID.
    fn check_local(
        &self,
        _previous: Option<&Self>,
        _store: &BTreeMap<Self::Id, Self>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Same-store counterpart of `on_delete`: refuses the delete while another record of
    /// this store still points at `self`. Runs before `on_delete`.
    fn check_delete(&self, _store: &BTreeMap<Self::Id, Self>) -> Result<(), ServiceError> {
        Ok(())
    }

    // --- Lifecycle Hooks (Async) ---

    /// Called after construction and before the entity is stored. Validation and
    /// foreign-key checks belong here.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Apply a patch to (a copy of) the stored entity and re-validate it.
    async fn on_update(&mut self, patch: Self::Patch, ctx: &Self::Context)
        -> Result<(), ServiceError>;

    /// Called before removal. Cascades run here; an error aborts the delete.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Runs once the new record is stored. Index upkeep on peers goes here; it cannot fail
    /// the request, so implementations log what they could not propagate.
    async fn after_create(&self, _ctx: &Self::Context) {}

    /// Runs once the updated record replaced `previous`.
    async fn after_update(&self, _previous: &Self, _ctx: &Self::Context) {}

    /// Runs once the record is gone.
    async fn after_delete(&self, _ctx: &Self::Context) {}

    /// Handle a custom entity-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, ServiceError>;
}
