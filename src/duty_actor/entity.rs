//! [`OwnedEntity`] implementation for [`Duty`].

use crate::model::{
    Duty, DutyAction, DutyCreate, DutyFilter, DutyId, DutyPatch, Registration, RegistrationAction,
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
pub struct DutyContext {
    cascade: CascadeCoordinator<DutyId>,
}

impl DutyContext {
    /// Registrations outlive a withdrawn duty: the reference is cleared, the booking stays.
    pub fn new(registrations: ResourceClient<Registration>, gate: Arc<FailureGate>) -> Self {
        let cascade = CascadeCoordinator::new("duty").detach(Arc::new(ReferenceField::new(
            "registration",
            registrations,
            gate,
            |duty: &DutyId| RegistrationFilter::Duty(*duty),
            |_: &DutyId| RegistrationAction::ClearDuty,
        )));
        Self { cascade }
    }
}

#[async_trait]
impl OwnedEntity for Duty {
    type Id = DutyId;
    type Create = DutyCreate;
    type Patch = DutyPatch;
    type Filter = DutyFilter;
    type Action = DutyAction;
    type ActionResult = Duty;
    type Context = DutyContext;

    fn id(&self) -> &DutyId {
        &self.id
    }

    fn from_create_params(id: DutyId, params: DutyCreate) -> Result<Self, ServiceError> {
        Ok(Duty::new(id, params))
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("name {}", self.name.trim().to_lowercase()))
    }

    fn matches(&self, filter: &DutyFilter) -> bool {
        match filter {
            DutyFilter::Name(name) => self.name.eq_ignore_ascii_case(name),
            DutyFilter::Active(active) => self.active == *active,
        }
    }

    async fn on_create(&mut self, _ctx: &DutyContext) -> Result<(), ServiceError> {
        self.validated()
    }

    async fn on_update(&mut self, patch: DutyPatch, _ctx: &DutyContext) -> Result<(), ServiceError> {
        self.merge(patch);
        self.validated()
    }

    async fn on_delete(&self, ctx: &DutyContext) -> Result<(), ServiceError> {
        let report = ctx.cascade.before_delete(&self.id).await?;
        info!(duty = %self.id, detached = report.detached, "Registrations detached");
        Ok(())
    }

    async fn handle_action(&mut self, action: DutyAction, _ctx: &DutyContext) -> Result<Duty, ServiceError> {
        match action {
            DutyAction::SetActive(active) => self.active = active,
        }
        Ok(self.clone())
    }
}
