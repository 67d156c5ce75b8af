//! [`OwnedEntity`] implementation for [`Registration`].
//!
//! Every reference is checked against its owner on creation and all problems are reported
//! together: a request missing the duty and naming an unknown client gets both messages.

use crate::model::{
    Client, ClientId, Duty, DutyId, Employee, EmployeeId, MedicalResult, Registration,
    RegistrationAction, RegistrationCreate, RegistrationFilter, RegistrationId, RegistrationPatch,
    ResultFilter,
};
use async_trait::async_trait;
use fleet_framework::{
    CascadeCoordinator, FailureGate, ForeignKeyChecker, OwnedEntity, ReferenceField,
    RemoteResolver, ResourceClient, ServiceError,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct RegistrationContext {
    duties: RemoteResolver<DutyId, Duty>,
    doctors: RemoteResolver<EmployeeId, Employee>,
    clients: RemoteResolver<ClientId, Client>,
    cascade: CascadeCoordinator<RegistrationId>,
}

impl RegistrationContext {
    pub fn new(
        duties: RemoteResolver<DutyId, Duty>,
        doctors: RemoteResolver<EmployeeId, Employee>,
        clients: RemoteResolver<ClientId, Client>,
        results: ResourceClient<MedicalResult>,
        result_gate: Arc<FailureGate>,
    ) -> Self {
        let cascade = CascadeCoordinator::new("registration").restrict(Arc::new(
            ReferenceField::counting("result", results, result_gate, |registration: &RegistrationId| {
                ResultFilter::Registration(*registration)
            }),
        ));
        Self {
            duties,
            doctors,
            clients,
            cascade,
        }
    }
}

fn inspect_duty(fk: &mut ForeignKeyChecker, duty: Option<Duty>) {
    if let Some(duty) = duty.filter(|d| !d.active) {
        fk.reject("duty", format!("duty {} is not active", duty.id));
    }
}

fn inspect_doctor(fk: &mut ForeignKeyChecker, employee: Option<Employee>) {
    if let Some(employee) = employee.filter(|e| !e.is_doctor()) {
        fk.reject("doctor", format!("employee {} is not a doctor", employee.id));
    }
}

#[async_trait]
impl OwnedEntity for Registration {
    type Id = RegistrationId;
    type Create = RegistrationCreate;
    type Patch = RegistrationPatch;
    type Filter = RegistrationFilter;
    type Action = RegistrationAction;
    type ActionResult = Registration;
    type Context = RegistrationContext;

    fn id(&self) -> &RegistrationId {
        &self.id
    }

    fn from_create_params(id: RegistrationId, params: RegistrationCreate) -> Result<Self, ServiceError> {
        Ok(Registration::new(id, params))
    }

    fn matches(&self, filter: &RegistrationFilter) -> bool {
        match filter {
            RegistrationFilter::Duty(duty) => self.duty == Some(*duty),
            RegistrationFilter::Doctor(doctor) => self.doctor == Some(*doctor),
            RegistrationFilter::Client(client) => self.client == Some(*client),
            RegistrationFilter::Active(active) => self.active == *active,
        }
    }

    async fn on_create(&mut self, ctx: &RegistrationContext) -> Result<(), ServiceError> {
        let mut fk = ForeignKeyChecker::new();
        let duty = fk.require("duty", "duty", self.duty, &ctx.duties).await?;
        inspect_duty(&mut fk, duty);
        let doctor = fk.require("doctor", "doctor", self.doctor, &ctx.doctors).await?;
        inspect_doctor(&mut fk, doctor);
        if let Some(client) = fk.require("client", "client", self.client, &ctx.clients).await? {
            if !client.enabled {
                fk.reject("client", format!("client {} is disabled", client.id));
            }
        }
        fk.finish()
    }

    async fn on_update(&mut self, patch: RegistrationPatch, ctx: &RegistrationContext) -> Result<(), ServiceError> {
        let changed = self.merge(patch);
        let mut fk = ForeignKeyChecker::new();
        if let Some(duty) = changed.duty {
            let duty = fk.check("duty", duty, &ctx.duties).await?;
            inspect_duty(&mut fk, duty);
        }
        if let Some(doctor) = changed.doctor {
            let doctor = fk.check("doctor", doctor, &ctx.doctors).await?;
            inspect_doctor(&mut fk, doctor);
        }
        fk.finish()
    }

    async fn on_delete(&self, ctx: &RegistrationContext) -> Result<(), ServiceError> {
        ctx.cascade.before_delete(&self.id).await?;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: RegistrationAction,
        _ctx: &RegistrationContext,
    ) -> Result<Registration, ServiceError> {
        match action {
            RegistrationAction::ClearDuty => {
                info!(registration = %self.id, duty = ?self.duty, "Duty detached");
                self.duty = None;
            }
            RegistrationAction::SetActive(active) => self.active = active,
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeBase, PersonalData, StaffRole};
    use chrono::Utc;
    use fleet_framework::mock::MockClient;
    use fleet_framework::{FrameworkError, GateConfig, ResourceActor};

    struct Peers {
        duties: MockClient<Duty>,
        staff: MockClient<Employee>,
        clients: MockClient<Client>,
        results: MockClient<MedicalResult>,
    }

    impl Peers {
        fn new() -> Self {
            Self {
                duties: MockClient::new(),
                staff: MockClient::new(),
                clients: MockClient::new(),
                results: MockClient::new(),
            }
        }

        fn start(&self) -> ResourceClient<Registration> {
            let gate = |name: &str| Arc::new(FailureGate::new(name, GateConfig::default()));
            let (actor, registrations) = ResourceActor::new(8);
            tokio::spawn(actor.run(RegistrationContext::new(
                RemoteResolver::new("duty", Arc::new(self.duties.client()), gate("registration->duty")),
                RemoteResolver::new("staff", Arc::new(self.staff.client()), gate("registration->staff")),
                RemoteResolver::new("client", Arc::new(self.clients.client()), gate("registration->client")),
                self.results.client(),
                gate("registration->result"),
            )));
            registrations
        }
    }

    fn duty(id: u32) -> Duty {
        Duty {
            id: DutyId(id),
            name: "ECG".into(),
            description: None,
            price: 120.0,
            active: true,
        }
    }

    fn employee(id: u32, role: StaffRole) -> Employee {
        Employee {
            id: EmployeeId(id),
            base: EmployeeBase {
                first_name: "Jan".into(),
                last_name: "Kowalski".into(),
                email: format!("e{id}@clinic.org"),
                active: true,
            },
            role,
        }
    }

    fn client(id: u32) -> Client {
        Client {
            id: ClientId(id),
            email: "a@b.com".into(),
            password: String::new(),
            enabled: true,
            personal_data: PersonalData::default(),
        }
    }

    fn booking(duty: Option<u32>, doctor: Option<u32>, client: Option<u32>) -> RegistrationCreate {
        RegistrationCreate {
            duty: duty.map(DutyId),
            doctor: doctor.map(EmployeeId),
            client: client.map(ClientId),
            start: Utc::now(),
        }
    }

    #[tokio::test]
    async fn every_missing_reference_is_reported_at_once() {
        let peers = Peers::new();
        let registrations = peers.start();
        let err = registrations.create(booking(None, None, None)).await.unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Validation(ref m))
                if m == "duty id is mandatory; doctor id is mandatory; client id is mandatory"
        ));
    }

    #[tokio::test]
    async fn a_manager_cannot_take_a_registration() {
        let mut peers = Peers::new();
        let registrations = peers.start();

        peers.duties.expect_get(DutyId(1)).return_ok(Some(duty(1)));
        peers
            .staff
            .expect_get(EmployeeId(2))
            .return_ok(Some(employee(2, StaffRole::TopManager)));
        peers.clients.expect_get(ClientId(7)).return_ok(None);

        let err = registrations.create(booking(Some(1), Some(2), Some(7))).await.unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Validation(ref m))
                if m == "employee 2 is not a doctor; no client with id 7"
        ));
    }

    #[tokio::test]
    async fn unreachable_client_service_escalates() {
        let mut peers = Peers::new();
        let registrations = peers.start();

        peers.duties.expect_get(DutyId(1)).return_ok(Some(duty(1)));
        peers.staff.expect_get(EmployeeId(2)).return_ok(Some(employee(
            2,
            StaffRole::Doctor {
                department: None,
                specialization: None,
            },
        )));
        peers
            .clients
            .expect_get(ClientId(3))
            .return_err(FrameworkError::ActorClosed);

        let err = registrations.create(booking(Some(1), Some(2), Some(3))).await.unwrap_err();
        match err {
            FrameworkError::Service(e @ ServiceError::RemoteUnavailable { .. }) => {
                assert!(!e.is_client_fixable());
                assert_eq!(e.status(), 500);
            }
            other => panic!("expected RemoteUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn patch_rechecks_only_the_moved_reference() {
        let mut peers = Peers::new();
        let registrations = peers.start();

        peers.duties.expect_get(DutyId(1)).return_ok(Some(duty(1)));
        peers.staff.expect_get(EmployeeId(2)).return_ok(Some(employee(
            2,
            StaffRole::Doctor {
                department: None,
                specialization: None,
            },
        )));
        peers.clients.expect_get(ClientId(3)).return_ok(Some(client(3)));
        let id = registrations.create(booking(Some(1), Some(2), Some(3))).await.unwrap();

        let mut retired = duty(4);
        retired.active = false;
        peers.duties.expect_get(DutyId(4)).return_ok(Some(retired));
        let err = registrations
            .update(
                id,
                RegistrationPatch {
                    duty: Some(DutyId(4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Validation(ref m)) if m == "duty 4 is not active"
        ));
        assert_eq!(registrations.get(id).await.unwrap().unwrap().duty, Some(DutyId(1)));

        peers.results.expect_list().return_ok(vec![]);
        registrations.delete(id).await.unwrap();
        peers.duties.verify();
        peers.staff.verify();
        peers.clients.verify();
        peers.results.verify();
    }
}
