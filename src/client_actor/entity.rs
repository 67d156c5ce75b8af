//! [`OwnedEntity`] implementation for [`Client`].

use crate::model::{
    Client, ClientAction, ClientCreate, ClientFilter, ClientId, ClientPatch, Registration,
    RegistrationFilter,
};
use async_trait::async_trait;
use fleet_framework::{
    CascadeCoordinator, FailureGate, Merge, OwnedEntity, ReferenceField, ResourceClient,
    ServiceError, Validate,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ClientContext {
    cascade: CascadeCoordinator<ClientId>,
}

impl ClientContext {
    pub fn new(registrations: ResourceClient<Registration>, gate: Arc<FailureGate>) -> Self {
        let cascade = CascadeCoordinator::new("client").restrict(Arc::new(ReferenceField::counting(
            "registration",
            registrations,
            gate,
            |client: &ClientId| RegistrationFilter::Client(*client),
        )));
        Self { cascade }
    }
}

#[async_trait]
impl OwnedEntity for Client {
    type Id = ClientId;
    type Create = ClientCreate;
    type Patch = ClientPatch;
    type Filter = ClientFilter;
    type Action = ClientAction;
    type ActionResult = Client;
    type Context = ClientContext;

    fn id(&self) -> &ClientId {
        &self.id
    }

    fn from_create_params(id: ClientId, params: ClientCreate) -> Result<Self, ServiceError> {
        Ok(Client::new(id, params))
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("email {}", self.email.to_lowercase()))
    }

    fn matches(&self, filter: &ClientFilter) -> bool {
        match filter {
            ClientFilter::Email(email) => self.email.eq_ignore_ascii_case(email),
            ClientFilter::Enabled(enabled) => self.enabled == *enabled,
        }
    }

    async fn on_create(&mut self, _ctx: &ClientContext) -> Result<(), ServiceError> {
        self.validated()
    }

    async fn on_update(&mut self, patch: ClientPatch, _ctx: &ClientContext) -> Result<(), ServiceError> {
        self.merge(patch);
        self.validated()
    }

    async fn on_delete(&self, ctx: &ClientContext) -> Result<(), ServiceError> {
        ctx.cascade.before_delete(&self.id).await?;
        Ok(())
    }

    async fn handle_action(&mut self, action: ClientAction, _ctx: &ClientContext) -> Result<Client, ServiceError> {
        match action {
            ClientAction::SetEnabled(enabled) => {
                self.enabled = enabled;
                info!(client = %self.id, enabled, "Client status changed");
            }
        }
        Ok(self.clone())
    }
}
