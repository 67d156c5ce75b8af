use crate::model::{Client, ClientAction, ClientFilter, ClientId, ClientPatch};
use async_trait::async_trait;
use fleet_framework::{
    AuthContext, Capability, Redact, ResourceClient, ServiceClient, ServiceError,
};
use tracing::instrument;

/// Client for the client service. Sign-up is open; a client may edit their own record.
#[derive(Clone)]
pub struct ClientServiceClient {
    inner: ResourceClient<Client>,
}

impl ClientServiceClient {
    pub fn new(inner: ResourceClient<Client>) -> Self {
        Self { inner }
    }

    pub async fn find_by_email(&self, auth: &AuthContext, email: &str) -> Result<Option<Client>, ServiceError> {
        let found = self.find_by(auth, ClientFilter::Email(email.to_string())).await?;
        Ok(found.into_iter().next())
    }
}

#[async_trait]
impl ServiceClient<Client> for ClientServiceClient {
    const SERVICE: &'static str = "client";
    const WRITE: Capability = Capability::ManageClients;
    const PUBLIC_CREATE: bool = true;

    fn inner(&self) -> &ResourceClient<Client> {
        &self.inner
    }

    #[instrument(skip(self, auth))]
    async fn patch(&self, auth: &AuthContext, id: ClientId, patch: ClientPatch) -> Result<Client, ServiceError> {
        if !auth.is_client(id.0) {
            auth.require(Self::WRITE)?;
        }
        self.inner
            .update(id, patch)
            .await
            .map(|client| client.redact(auth))
            .map_err(|e| ServiceError::classify(Self::SERVICE, "patch", &id, e))
    }

    #[instrument(skip(self, auth))]
    async fn set_status(&self, auth: &AuthContext, id: ClientId, active: bool) -> Result<Client, ServiceError> {
        auth.require(Self::WRITE)?;
        self.inner
            .perform_action(id, ClientAction::SetEnabled(active))
            .await
            .map(|client| client.redact(auth))
            .map_err(|e| ServiceError::classify(Self::SERVICE, "set_status", &id, e))
    }
}
