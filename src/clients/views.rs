//! Composed views: an owned record plus best-effort snapshots of what it references.
//!
//! A snapshot that cannot be resolved (peer down, breaker open, record gone) is absent from
//! the view; the view itself is always produced. Redaction runs over the finished view.

use crate::model::{
    Client, ClientId, Department, DepartmentId, Duty, DutyId, Employee, EmployeeId, FacilityId,
    MedicalFacility, MedicalResult, Registration, RegistrationId,
};
use async_trait::async_trait;
use fleet_framework::{AuthContext, Capability, Compose, Redact, RemoteResolver};
use serde::Serialize;

/// Resolvers a registration view draws on.
#[derive(Clone)]
pub struct RegistrationPeers {
    pub duties: RemoteResolver<DutyId, Duty>,
    pub doctors: RemoteResolver<EmployeeId, Employee>,
    pub clients: RemoteResolver<ClientId, Client>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub registration: Registration,
    pub duty: Option<Duty>,
    pub doctor: Option<Employee>,
    pub client: Option<Client>,
}

#[async_trait]
impl Compose for Registration {
    type View = RegistrationView;
    type Peers = RegistrationPeers;

    async fn compose(self, peers: &RegistrationPeers) -> RegistrationView {
        let (duty, doctor, client) = futures::join!(
            peers.duties.resolve_opt(self.duty),
            peers.doctors.resolve_opt(self.doctor),
            peers.clients.resolve_opt(self.client),
        );
        RegistrationView {
            registration: self,
            duty,
            doctor,
            client,
        }
    }
}

impl Redact for RegistrationView {
    fn redact(mut self, auth: &AuthContext) -> Self {
        self.client = self.client.map(|client| client.redact(auth));
        self.doctor = self.doctor.map(|doctor| doctor.redact(auth));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub result: MedicalResult,
    pub registration: Option<Registration>,
}

#[async_trait]
impl Compose for MedicalResult {
    type View = ResultView;
    type Peers = RemoteResolver<RegistrationId, Registration>;

    async fn compose(self, registrations: &Self::Peers) -> ResultView {
        let registration = registrations.resolve_opt(self.registration).await;
        ResultView {
            result: self,
            registration,
        }
    }
}

/// The content is shown to result writers and to the client the registration belongs to.
/// Without a registration snapshot ownership cannot be shown, so the content is withheld.
impl Redact for ResultView {
    fn redact(mut self, auth: &AuthContext) -> Self {
        let owner = self.registration.as_ref().and_then(|r| r.client);
        let is_owner = owner.is_some_and(|client| auth.is_client(client.0));
        if !auth.can(Capability::WriteResults) && !is_owner {
            self.result.strip_description();
        }
        self
    }
}

#[derive(Clone)]
pub struct EmployeePeers {
    pub departments: RemoteResolver<DepartmentId, Department>,
    pub staff: RemoteResolver<EmployeeId, Employee>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub employee: Employee,
    pub department: Option<Department>,
    /// Members of a team manager's team that could be resolved.
    pub team: Vec<Employee>,
}

#[async_trait]
impl Compose for Employee {
    type View = EmployeeView;
    type Peers = EmployeePeers;

    async fn compose(self, peers: &EmployeePeers) -> EmployeeView {
        let team_ids = self.role.team().to_vec();
        let (department, team) = futures::join!(
            peers.departments.resolve_opt(self.role.department()),
            peers.staff.resolve_all(team_ids),
        );
        EmployeeView {
            employee: self,
            department,
            team,
        }
    }
}

impl Redact for EmployeeView {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentView {
    pub department: Department,
    pub facility: Option<MedicalFacility>,
}

#[async_trait]
impl Compose for Department {
    type View = DepartmentView;
    type Peers = RemoteResolver<FacilityId, MedicalFacility>;

    async fn compose(self, facilities: &Self::Peers) -> DepartmentView {
        let facility = facilities.resolve_opt(self.facility).await;
        DepartmentView {
            department: self,
            facility,
        }
    }
}

impl Redact for DepartmentView {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientId, MedicalResultId};
    use chrono::Utc;
    use fleet_framework::mock::MockClient;
    use fleet_framework::{FailureGate, FrameworkError, GateConfig, Role};
    use std::sync::Arc;

    fn result() -> MedicalResult {
        MedicalResult {
            id: MedicalResultId(1),
            description: Some("all clear".into()),
            recommendations: None,
            registration: Some(RegistrationId(2)),
        }
    }

    fn registration() -> Registration {
        Registration {
            id: RegistrationId(2),
            duty: None,
            doctor: None,
            client: Some(ClientId(5)),
            start: Utc::now(),
            active: true,
        }
    }

    fn resolver(mock: &MockClient<Registration>) -> RemoteResolver<RegistrationId, Registration> {
        RemoteResolver::new(
            "registration",
            Arc::new(mock.client()),
            Arc::new(FailureGate::new("result->registration", GateConfig::default())),
        )
    }

    #[tokio::test]
    async fn owning_client_reads_their_result() {
        let mut registrations = MockClient::new();
        registrations.expect_get(RegistrationId(2)).return_ok(Some(registration()));
        registrations.expect_get(RegistrationId(2)).return_ok(Some(registration()));
        let peers = resolver(&registrations);

        let own = fleet_framework::compose_for(result(), &peers, &AuthContext::new(5, Role::Client)).await;
        assert_eq!(own.result.description.as_deref(), Some("all clear"));

        let other = fleet_framework::compose_for(result(), &peers, &AuthContext::new(6, Role::Client)).await;
        assert!(other.result.description.is_none());
        registrations.verify();
    }

    #[tokio::test]
    async fn unresolved_registration_withholds_content_but_still_composes() {
        let mut registrations = MockClient::new();
        registrations
            .expect_get(RegistrationId(2))
            .return_err(FrameworkError::ActorClosed);
        let peers = resolver(&registrations);

        let view = fleet_framework::compose_for(result(), &peers, &AuthContext::new(5, Role::Client)).await;
        assert!(view.registration.is_none());
        assert!(view.result.description.is_none());
        assert_eq!(view.result.id, MedicalResultId(1));
    }
}
