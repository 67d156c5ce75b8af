//! [`OwnedEntity`] implementation for [`Employee`].
//!
//! | hook | what it checks or does |
//! |------|------------------------|
//! | `on_create` | field constraints, department reference (doctors and team managers) |
//! | `check_local` | a changed team lists only doctors of this store |
//! | `check_delete` | a doctor on some manager's team stays |
//! | `on_update` | merge, constraints, department reference if it moved |
//! | `on_delete` | a doctor with registrations stays |
//! | `after_*` | department doctor index |

use crate::model::{
    Department, DepartmentAction, DepartmentId, Employee, EmployeeAction, EmployeeCreate,
    EmployeeFilter, EmployeeId, EmployeePatch, Registration, RegistrationFilter,
};
use async_trait::async_trait;
use fleet_framework::{
    CascadeCoordinator, FailureGate, ForeignKeyChecker, IndexLink, OwnedEntity, ReferenceField,
    RemoteResolver, ResourceClient, ServiceError, Validate, Violations,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct StaffContext {
    departments: RemoteResolver<DepartmentId, Department>,
    roster: IndexLink<Department>,
    cascade: CascadeCoordinator<EmployeeId>,
}

impl StaffContext {
    pub fn new(
        departments: RemoteResolver<DepartmentId, Department>,
        roster: IndexLink<Department>,
        registrations: ResourceClient<Registration>,
        registration_gate: Arc<FailureGate>,
    ) -> Self {
        let cascade = CascadeCoordinator::new("employee").restrict(Arc::new(ReferenceField::counting(
            "registration",
            registrations,
            registration_gate,
            |doctor: &EmployeeId| RegistrationFilter::Doctor(*doctor),
        )));
        Self {
            departments,
            roster,
            cascade,
        }
    }
}

#[async_trait]
impl OwnedEntity for Employee {
    type Id = EmployeeId;
    type Create = EmployeeCreate;
    type Patch = EmployeePatch;
    type Filter = EmployeeFilter;
    type Action = EmployeeAction;
    type ActionResult = Employee;
    type Context = StaffContext;

    fn id(&self) -> &EmployeeId {
        &self.id
    }

    fn from_create_params(id: EmployeeId, params: EmployeeCreate) -> Result<Self, ServiceError> {
        Ok(Employee::new(id, params))
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("email {}", self.base.email.to_lowercase()))
    }

    fn matches(&self, filter: &EmployeeFilter) -> bool {
        match filter {
            EmployeeFilter::Kind(kind) => self.role.kind() == *kind,
            EmployeeFilter::Department(department) => self.role.department() == Some(*department),
            EmployeeFilter::Active(active) => self.base.active == *active,
        }
    }

    fn check_local(
        &self,
        previous: Option<&Employee>,
        store: &BTreeMap<EmployeeId, Employee>,
    ) -> Result<(), ServiceError> {
        if previous.is_some_and(|p| p.role.team() == self.role.team()) {
            return Ok(());
        }
        let mut v = Violations::new();
        for member in self.role.team() {
            let is_doctor = store.get(member).is_some_and(Employee::is_doctor);
            v.check(is_doctor, "team", format!("no doctor with id {member}"));
        }
        v.into_result()
    }

    fn check_delete(&self, store: &BTreeMap<EmployeeId, Employee>) -> Result<(), ServiceError> {
        let teams = store
            .values()
            .filter(|e| e.role.team().contains(&self.id))
            .count();
        match teams {
            0 => Ok(()),
            n => Err(ServiceError::Conflict(format!(
                "employee {} is still referenced by {n} team(s); delete dependents first",
                self.id
            ))),
        }
    }

    async fn on_create(&mut self, ctx: &StaffContext) -> Result<(), ServiceError> {
        let mut fk = ForeignKeyChecker::after(self.validate());
        if self.role.needs_department() {
            fk.require("department", "department", self.role.department(), &ctx.departments)
                .await?;
        }
        fk.finish()
    }

    async fn on_update(&mut self, patch: EmployeePatch, ctx: &StaffContext) -> Result<(), ServiceError> {
        let before = self.role.department();
        self.merge(patch);
        let mut fk = ForeignKeyChecker::after(self.validate());
        let now = self.role.department();
        if now != before {
            fk.optional("department", now, &ctx.departments).await?;
        }
        fk.finish()
    }

    async fn on_delete(&self, ctx: &StaffContext) -> Result<(), ServiceError> {
        if self.is_doctor() {
            ctx.cascade.before_delete(&self.id).await?;
        }
        Ok(())
    }

    async fn after_create(&self, ctx: &StaffContext) {
        if let (true, Some(department)) = (self.is_doctor(), self.role.department()) {
            ctx.roster
                .apply(department, DepartmentAction::AddDoctor(self.id))
                .await;
        }
    }

    async fn after_update(&self, previous: &Employee, ctx: &StaffContext) {
        let (from, to) = (previous.role.department(), self.role.department());
        if !self.is_doctor() || from == to {
            return;
        }
        if let Some(from) = from {
            ctx.roster.apply(from, DepartmentAction::RemoveDoctor(self.id)).await;
        }
        if let Some(to) = to {
            ctx.roster.apply(to, DepartmentAction::AddDoctor(self.id)).await;
        }
        info!(doctor = %self.id, ?from, ?to, "Doctor moved");
    }

    async fn after_delete(&self, ctx: &StaffContext) {
        if let (true, Some(department)) = (self.is_doctor(), self.role.department()) {
            ctx.roster
                .apply(department, DepartmentAction::RemoveDoctor(self.id))
                .await;
        }
    }

    async fn handle_action(&mut self, action: EmployeeAction, _ctx: &StaffContext) -> Result<Employee, ServiceError> {
        match action {
            EmployeeAction::SetActive(active) => self.base.active = active,
        }
        Ok(self.clone())
    }
}
