use crate::model::{Duty, DutyAction, DutyId};
use async_trait::async_trait;
use fleet_framework::{AuthContext, Capability, ResourceClient, ServiceClient, ServiceError};
use tracing::instrument;

/// Client for the duty catalogue. Anyone may browse it.
#[derive(Clone)]
pub struct DutyClient {
    inner: ResourceClient<Duty>,
}

impl DutyClient {
    pub fn new(inner: ResourceClient<Duty>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ServiceClient<Duty> for DutyClient {
    const SERVICE: &'static str = "duty";
    const WRITE: Capability = Capability::ManageCatalog;
    const PUBLIC_READ: bool = true;

    fn inner(&self) -> &ResourceClient<Duty> {
        &self.inner
    }

    #[instrument(skip(self, auth))]
    async fn set_status(&self, auth: &AuthContext, id: DutyId, active: bool) -> Result<Duty, ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner
            .perform_action(id, DutyAction::SetActive(active))
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "set_status", &id, e))
    }
}
