//! [`OwnedEntity`] implementation for [`MedicalFacility`].

use crate::model::{
    Department, DepartmentAction, DepartmentFilter, FacilityAction, FacilityCreate,
    FacilityFilter, FacilityId, FacilityPatch, MedicalFacility,
};
use async_trait::async_trait;
use fleet_framework::{
    CascadeCoordinator, FailureGate, Merge, OwnedEntity, ReferenceField, ResourceClient,
    ServiceError, Validate,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct FacilityContext {
    cascade: CascadeCoordinator<FacilityId>,
}

impl FacilityContext {
    /// Deleting a facility detaches its departments; they stay, without a facility.
    pub fn new(departments: ResourceClient<Department>, gate: Arc<FailureGate>) -> Self {
        let cascade = CascadeCoordinator::new("facility").detach(Arc::new(ReferenceField::new(
            "department",
            departments,
            gate,
            |facility: &FacilityId| DepartmentFilter::Facility(*facility),
            |_: &FacilityId| DepartmentAction::ClearFacility,
        )));
        Self { cascade }
    }
}

#[async_trait]
impl OwnedEntity for MedicalFacility {
    type Id = FacilityId;
    type Create = FacilityCreate;
    type Patch = FacilityPatch;
    type Filter = FacilityFilter;
    type Action = FacilityAction;
    type ActionResult = MedicalFacility;
    type Context = FacilityContext;

    fn id(&self) -> &FacilityId {
        &self.id
    }

    fn from_create_params(id: FacilityId, params: FacilityCreate) -> Result<Self, ServiceError> {
        Ok(MedicalFacility::new(id, params))
    }

    fn matches(&self, filter: &FacilityFilter) -> bool {
        match filter {
            FacilityFilter::Name(name) => self.name.eq_ignore_ascii_case(name),
        }
    }

    async fn on_create(&mut self, _ctx: &FacilityContext) -> Result<(), ServiceError> {
        self.validated()
    }

    async fn on_update(&mut self, patch: FacilityPatch, _ctx: &FacilityContext) -> Result<(), ServiceError> {
        self.merge(patch);
        self.validated()
    }

    async fn on_delete(&self, ctx: &FacilityContext) -> Result<(), ServiceError> {
        ctx.cascade.before_delete(&self.id).await?;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: FacilityAction,
        _ctx: &FacilityContext,
    ) -> Result<MedicalFacility, ServiceError> {
        match action {
            FacilityAction::AddDepartment(department) => {
                self.department_ids.insert(department);
            }
            FacilityAction::RemoveDepartment(department) => {
                self.department_ids.remove(&department);
            }
        }
        Ok(self.clone())
    }
}
