//! [`OwnedEntity`] implementation for [`Department`].

use crate::model::{
    Department, DepartmentAction, DepartmentCreate, DepartmentFilter, DepartmentId,
    DepartmentPatch, Employee, EmployeeFilter, FacilityAction, FacilityId, MedicalFacility,
};
use async_trait::async_trait;
use fleet_framework::{
    CascadeCoordinator, FailureGate, ForeignKeyChecker, IndexLink, Merge, OwnedEntity,
    ReferenceField, RemoteResolver, ResourceClient, ServiceError, Validate,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct DepartmentContext {
    facilities: RemoteResolver<FacilityId, MedicalFacility>,
    facility_index: IndexLink<MedicalFacility>,
    cascade: CascadeCoordinator<DepartmentId>,
}

impl DepartmentContext {
    /// Any employee assigned to the department (doctor or team manager) restricts its delete.
    pub fn new(
        facilities: RemoteResolver<FacilityId, MedicalFacility>,
        facility_index: IndexLink<MedicalFacility>,
        staff: ResourceClient<Employee>,
        staff_gate: Arc<FailureGate>,
    ) -> Self {
        let cascade = CascadeCoordinator::new("department").restrict(Arc::new(ReferenceField::counting(
            "employee",
            staff,
            staff_gate,
            |department: &DepartmentId| EmployeeFilter::Department(*department),
        )));
        Self {
            facilities,
            facility_index,
            cascade,
        }
    }
}

#[async_trait]
impl OwnedEntity for Department {
    type Id = DepartmentId;
    type Create = DepartmentCreate;
    type Patch = DepartmentPatch;
    type Filter = DepartmentFilter;
    type Action = DepartmentAction;
    type ActionResult = Department;
    type Context = DepartmentContext;

    fn id(&self) -> &DepartmentId {
        &self.id
    }

    fn from_create_params(id: DepartmentId, params: DepartmentCreate) -> Result<Self, ServiceError> {
        Ok(Department::new(id, params))
    }

    fn matches(&self, filter: &DepartmentFilter) -> bool {
        match filter {
            DepartmentFilter::Facility(facility) => self.facility == Some(*facility),
            DepartmentFilter::Name(name) => self.name.eq_ignore_ascii_case(name),
        }
    }

    async fn on_create(&mut self, ctx: &DepartmentContext) -> Result<(), ServiceError> {
        let mut fk = ForeignKeyChecker::after(self.validate());
        fk.optional("facility", self.facility, &ctx.facilities).await?;
        fk.finish()
    }

    async fn on_update(&mut self, patch: DepartmentPatch, ctx: &DepartmentContext) -> Result<(), ServiceError> {
        let before = self.facility;
        self.merge(patch);
        let mut fk = ForeignKeyChecker::after(self.validate());
        if self.facility != before {
            fk.optional("facility", self.facility, &ctx.facilities).await?;
        }
        fk.finish()
    }

    /// The local doctor index answers first; the staff store is asked only when it is empty,
    /// since managers are not indexed and the index may lag.
    async fn on_delete(&self, ctx: &DepartmentContext) -> Result<(), ServiceError> {
        if !self.doctor_ids.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "department {} is still referenced by {} doctor(s); delete dependents first",
                self.id,
                self.doctor_ids.len()
            )));
        }
        ctx.cascade.before_delete(&self.id).await.map(|_| ())
    }

    async fn after_create(&self, ctx: &DepartmentContext) {
        if let Some(facility) = self.facility {
            ctx.facility_index
                .apply(facility, FacilityAction::AddDepartment(self.id))
                .await;
        }
    }

    async fn after_update(&self, previous: &Department, ctx: &DepartmentContext) {
        if previous.facility == self.facility {
            return;
        }
        if let Some(from) = previous.facility {
            ctx.facility_index
                .apply(from, FacilityAction::RemoveDepartment(self.id))
                .await;
        }
        if let Some(to) = self.facility {
            ctx.facility_index
                .apply(to, FacilityAction::AddDepartment(self.id))
                .await;
        }
    }

    async fn after_delete(&self, ctx: &DepartmentContext) {
        if let Some(facility) = self.facility {
            ctx.facility_index
                .apply(facility, FacilityAction::RemoveDepartment(self.id))
                .await;
        }
    }

    async fn handle_action(
        &mut self,
        action: DepartmentAction,
        _ctx: &DepartmentContext,
    ) -> Result<Department, ServiceError> {
        match action {
            DepartmentAction::AddDoctor(doctor) => {
                self.doctor_ids.insert(doctor);
            }
            DepartmentAction::RemoveDoctor(doctor) => {
                self.doctor_ids.remove(&doctor);
            }
            // The facility is going away; its own index goes with it.
            DepartmentAction::ClearFacility => {
                info!(department = %self.id, facility = ?self.facility, "Facility detached");
                self.facility = None;
            }
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, EmployeeBase, EmployeeId, StaffRole};
    use fleet_framework::mock::MockClient;
    use fleet_framework::{FrameworkError, GateConfig, ResourceActor};
    use std::collections::BTreeSet;

    fn facility(id: u32) -> MedicalFacility {
        MedicalFacility {
            id: FacilityId(id),
            name: "Central".into(),
            address: Address::default(),
            department_ids: BTreeSet::new(),
        }
    }

    fn start(
        facilities: &MockClient<MedicalFacility>,
        staff: &MockClient<Employee>,
    ) -> ResourceClient<Department> {
        let gate = Arc::new(FailureGate::new("clinic->facility", GateConfig::default()));
        let (actor, departments) = ResourceActor::new(8);
        tokio::spawn(actor.run(DepartmentContext::new(
            RemoteResolver::new("facility", Arc::new(facilities.client()), gate.clone()),
            IndexLink::new("facility", facilities.client(), gate),
            staff.client(),
            Arc::new(FailureGate::new("clinic->staff", GateConfig::default())),
        )));
        departments
    }

    fn manager(department: u32) -> Employee {
        Employee {
            id: EmployeeId(7),
            base: EmployeeBase {
                first_name: "Ewa".into(),
                last_name: "Lis".into(),
                email: "ewa@clinic.org".into(),
                active: true,
            },
            role: StaffRole::TeamManager {
                department: Some(DepartmentId(department)),
                team: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn department_with_doctors_is_restricted() {
        let facilities = MockClient::new();
        let mut staff = MockClient::new();
        let departments = start(&facilities, &staff);
        let id = departments
            .create(DepartmentCreate {
                name: "Cardiology".into(),
                facility: None,
            })
            .await
            .unwrap();
        departments
            .perform_action(id, DepartmentAction::AddDoctor(EmployeeId(4)))
            .await
            .unwrap();

        let err = departments.delete(id).await.unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Conflict(ref m))
                if m == "department 1 is still referenced by 1 doctor(s); delete dependents first"
        ));

        departments
            .perform_action(id, DepartmentAction::RemoveDoctor(EmployeeId(4)))
            .await
            .unwrap();
        staff.expect_list().return_ok(vec![]);
        departments.delete(id).await.unwrap();
        staff.verify();
    }

    #[tokio::test]
    async fn team_manager_restricts_the_delete() {
        let facilities = MockClient::new();
        let mut staff = MockClient::new();
        let departments = start(&facilities, &staff);
        let id = departments
            .create(DepartmentCreate {
                name: "Cardiology".into(),
                facility: None,
            })
            .await
            .unwrap();

        staff.expect_list().return_ok(vec![manager(1)]);
        let err = departments.delete(id).await.unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Conflict(ref m))
                if m == "department 1 is still referenced by 1 employee(s); delete dependents first"
        ));
        assert!(departments.get(id).await.unwrap().is_some());

        staff
            .expect_list()
            .return_err(FrameworkError::ActorDropped);
        let err = departments.delete(id).await.unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::RemoteUnavailable { .. })
        ));
        assert!(departments.get(id).await.unwrap().is_some());
        staff.verify();
    }

    #[tokio::test]
    async fn attaching_to_a_facility_updates_its_index() {
        let mut facilities = MockClient::new();
        let mut staff = MockClient::new();
        let departments = start(&facilities, &staff);

        facilities.expect_get(FacilityId(3)).return_ok(Some(facility(3)));
        facilities.expect_action(FacilityId(3)).return_ok(facility(3));
        let id = departments
            .create(DepartmentCreate {
                name: "Cardiology".into(),
                facility: Some(FacilityId(3)),
            })
            .await
            .unwrap();

        staff.expect_list().return_ok(vec![]);
        facilities.expect_action(FacilityId(3)).return_ok(facility(3));
        departments.delete(id).await.unwrap();
        facilities.verify();
        staff.verify();
    }

    #[tokio::test]
    async fn lagging_index_does_not_fail_the_write() {
        let mut facilities = MockClient::new();
        let staff = MockClient::new();
        let departments = start(&facilities, &staff);

        facilities.expect_get(FacilityId(3)).return_ok(Some(facility(3)));
        facilities
            .expect_action(FacilityId(3))
            .return_err(FrameworkError::ActorDropped);
        let id = departments
            .create(DepartmentCreate {
                name: "Cardiology".into(),
                facility: Some(FacilityId(3)),
            })
            .await
            .unwrap();
        assert_eq!(departments.get(id).await.unwrap().unwrap().facility, Some(FacilityId(3)));
        facilities.verify();
    }
}
