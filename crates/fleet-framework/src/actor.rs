//! # Generic Service Actor
//!
//! This module defines the `ResourceActor`, the component that owns one service's store. It
//! is the "Server" side of the Actor Model: requests are processed sequentially, so the store
//! needs no locks, and peers can only reach the records through a
//! [`ResourceClient`](crate::ResourceClient).

use crate::client::ResourceClient;
use crate::entity::OwnedEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that owns the records of one entity type.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `ResourceActor::new()` to get the `actor` (server) and `client` (interface).
/// 2.  **Wire**: Pass dependencies (peer resolvers, cascade coordinators) into `actor.run(context)`.
/// 3.  **Run**: Spawn the actor's run loop in a background task.
///
/// ```rust
/// use fleet_framework::{define_id, OwnedEntity, ResourceActor, ServiceError};
/// use async_trait::async_trait;
///
/// define_id!(Note);
///
/// #[derive(Clone, Debug)] struct Note { id: NoteId, text: String }
/// #[derive(Debug)] struct NoteCreate { text: String }
/// #[derive(Debug)] struct NotePatch { text: Option<String> }
///
/// #[async_trait]
/// impl OwnedEntity for Note {
///     type Id = NoteId;
///     type Create = NoteCreate;
///     type Patch = NotePatch;
///     type Filter = ();
///     type Action = ();
///     type ActionResult = ();
///     type Context = ();
///
///     fn id(&self) -> &NoteId { &self.id }
///     fn from_create_params(id: NoteId, p: NoteCreate) -> Result<Self, ServiceError> {
///         Ok(Self { id, text: p.text })
///     }
///     async fn on_update(&mut self, p: NotePatch, _: &()) -> Result<(), ServiceError> {
///         if let Some(text) = p.text { self.text = text; }
///         Ok(())
///     }
///     async fn handle_action(&mut self, _: (), _: &()) -> Result<(), ServiceError> { Ok(()) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Note>::new(10);
///     tokio::spawn(actor.run(()));
///     let id = client.create(NoteCreate { text: "hi".into() }).await.unwrap();
///     assert_eq!(id, NoteId(1));
/// }
/// ```
///
/// ## Operations
///
/// * **Create**: next ID from the counter, `from_create_params`, `on_create`, `check_local`,
///   unique-key check, insert, `after_create`.
/// * **Get / List**: clone out of the store; `List` applies [`OwnedEntity::matches`].
/// * **Update**: `on_update` on a copy, `check_local`, unique-key check; commit the copy only
///   if all pass, then `after_update`.
/// * **Action**: `handle_action` on a copy; commit only on success.
/// * **Delete**: `check_delete` against this store, `on_delete` (cascade), then remove, then
///   `after_delete`.
/// * **Shutdown**: leave the loop.
pub struct ResourceActor<T: OwnedEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id: u32,
}

impl<T: OwnedEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the MPSC channel; when it is full, client calls wait.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id: 1,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Returns the colliding unique key, if `candidate` would break uniqueness.
    fn collision(&self, candidate: &T) -> Option<String> {
        let key = candidate.unique_key()?;
        self.store
            .values()
            .any(|other| other.id() != candidate.id() && other.unique_key().as_ref() == Some(&key))
            .then_some(key)
    }

    /// Same-store checks and uniqueness for a record about to be stored.
    fn admit(&self, candidate: &T, previous: Option<&T>) -> Result<(), FrameworkError> {
        candidate.check_local(previous, &self.store)?;
        match self.collision(candidate) {
            Some(key) => Err(FrameworkError::Conflict(key)),
            None => Ok(()),
        }
    }

    /// Runs the actor's event loop until the channel closes or `Shutdown` arrives.
    pub async fn run(mut self, context: T::Context) {
        // "Client" instead of "clinic_fleet::model::client::Client"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    self.next_id += 1;

                    let mut item = match T::from_create_params(id.clone(), params) {
                        Ok(item) => item,
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(e.into()));
                            continue;
                        }
                    };
                    if let Err(e) = item.on_create(&context).await {
                        warn!(entity_type, error = %e, "on_create failed");
                        let _ = respond_to.send(Err(e.into()));
                        continue;
                    }
                    if let Err(e) = self.admit(&item, None) {
                        warn!(entity_type, %id, error = %e, "Create rejected");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    self.store.insert(id.clone(), item.clone());
                    info!(entity_type, %id, size = self.store.len(), "Created");
                    item.after_create(&context).await;
                    let _ = respond_to.send(Ok(id));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = self
                        .store
                        .values()
                        .filter(|item| filter.as_ref().map_or(true, |f| item.matches(f)))
                        .cloned()
                        .collect();
                    debug!(entity_type, ?filter, count = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    patch,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?patch, "Update");
                    let Some(previous) = self.store.get(&id).cloned() else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut candidate = previous.clone();
                    if let Err(e) = candidate.on_update(patch, &context).await {
                        warn!(entity_type, %id, error = %e, "Update failed");
                        let _ = respond_to.send(Err(e.into()));
                        continue;
                    }
                    if let Err(e) = self.admit(&candidate, Some(&previous)) {
                        warn!(entity_type, %id, error = %e, "Update rejected");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    self.store.insert(id.clone(), candidate.clone());
                    info!(entity_type, %id, "Updated");
                    candidate.after_update(&previous, &context).await;
                    let _ = respond_to.send(Ok(candidate));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let Some(item) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = item.check_delete(&self.store) {
                        warn!(entity_type, %id, error = %e, "Delete rejected");
                        let _ = respond_to.send(Err(e.into()));
                        continue;
                    }
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(e.into()));
                        continue;
                    }
                    if let Some(removed) = self.store.remove(&id) {
                        info!(entity_type, %id, size = self.store.len(), "Deleted");
                        removed.after_delete(&context).await;
                    }
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(mut candidate) = self.store.get(&id).cloned() else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    match candidate.handle_action(action, &context).await {
                        Ok(result) => {
                            self.store.insert(id.clone(), candidate);
                            info!(entity_type, %id, "Action ok");
                            let _ = respond_to.send(Ok(result));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action failed");
                            let _ = respond_to.send(Err(e.into()));
                        }
                    }
                }
                ResourceRequest::Shutdown => break,
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
