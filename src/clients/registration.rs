use crate::clients::views::{RegistrationPeers, RegistrationView};
use crate::model::{Registration, RegistrationAction, RegistrationFilter, RegistrationId};
use async_trait::async_trait;
use fleet_framework::{
    compose_all, compose_for, AuthContext, Capability, ResourceClient, ServiceClient, ServiceError,
};
use tracing::instrument;

#[derive(Clone)]
pub struct RegistrationClient {
    inner: ResourceClient<Registration>,
    peers: RegistrationPeers,
}

impl RegistrationClient {
    pub fn new(inner: ResourceClient<Registration>, peers: RegistrationPeers) -> Self {
        Self { inner, peers }
    }

    /// Registration with duty, doctor and client snapshots. Degraded peers leave their
    /// snapshot out.
    #[instrument(skip(self, auth))]
    pub async fn find_view(&self, auth: &AuthContext, id: RegistrationId) -> Result<RegistrationView, ServiceError> {
        self.authorize_read(auth)?;
        let registration = self.fetch(id).await?;
        Ok(compose_for(registration, &self.peers, auth).await)
    }

    #[instrument(skip(self, auth))]
    pub async fn find_views(
        &self,
        auth: &AuthContext,
        filter: Option<RegistrationFilter>,
    ) -> Result<Vec<RegistrationView>, ServiceError> {
        self.authorize_read(auth)?;
        let registrations = self
            .inner
            .list(filter)
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "find_views", &"*", e))?;
        Ok(compose_all(registrations, &self.peers, auth).await)
    }
}

#[async_trait]
impl ServiceClient<Registration> for RegistrationClient {
    const SERVICE: &'static str = "registration";
    const WRITE: Capability = Capability::ManageRegistrations;

    fn inner(&self) -> &ResourceClient<Registration> {
        &self.inner
    }

    #[instrument(skip(self, auth))]
    async fn set_status(
        &self,
        auth: &AuthContext,
        id: RegistrationId,
        active: bool,
    ) -> Result<Registration, ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner
            .perform_action(id, RegistrationAction::SetActive(active))
            .await
            .map_err(|e| ServiceError::classify(Self::SERVICE, "set_status", &id, e))
    }
}
