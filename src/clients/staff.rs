use crate::clients::views::{EmployeePeers, EmployeeView};
use crate::model::{Employee, EmployeeAction, EmployeeFilter, EmployeeId};
use async_trait::async_trait;
use fleet_framework::{
    compose_all, compose_for, AuthContext, Capability, Redact, ResourceClient, ServiceClient,
    ServiceError,
};
use tracing::instrument;

#[derive(Clone)]
pub struct StaffClient {
    inner: ResourceClient<Employee>,
    peers: EmployeePeers,
}

impl StaffClient {
    pub fn new(inner: ResourceClient<Employee>, peers: EmployeePeers) -> Self {
        Self { inner, peers }
    }

    /// Employee with department and team snapshots.
    #[instrument(skip(self, auth))]
    pub async fn find_view(&self, auth: &AuthContext, id: EmployeeId) -> Result<EmployeeView, ServiceError> {
        self.authorize_read(auth)?;
        let employee = self.fetch(id).await?;
        Ok(compose_for(employee, &self.peers, auth).await)
    }

    #[instrument(skip(self, auth))]
    pub async fn find_views(
        &self,
        auth: &AuthContext,
        filter: Option<EmployeeFilter>,
    ) -> Result<Vec<EmployeeView>, ServiceError> {
        self.authorize_read(auth)?;
        let employees = self
            .inner
            .list(filter)
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "find_views", &"*", e))?;
        Ok(compose_all(employees, &self.peers, auth).await)
    }
}

#[async_trait]
impl ServiceClient<Employee> for StaffClient {
    const SERVICE: &'static str = "employee";
    const WRITE: Capability = Capability::ManageStaff;

    fn inner(&self) -> &ResourceClient<Employee> {
        &self.inner
    }

    #[instrument(skip(self, auth))]
    async fn set_status(&self, auth: &AuthContext, id: EmployeeId, active: bool) -> Result<Employee, ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner
            .perform_action(id, EmployeeAction::SetActive(active))
            .await
            .map(|employee| employee.redact(auth))
            .map_err(|e| ServiceError::classify(Self::SERVICE, "set_status", &id, e))
    }
}
