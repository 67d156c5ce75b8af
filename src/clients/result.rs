use crate::clients::views::ResultView;
use crate::model::{MedicalResult, MedicalResultId, Registration, RegistrationId};
use fleet_framework::{
    compose_for, AuthContext, Capability, RemoteResolver, ResourceClient, ServiceClient,
    ServiceError,
};
use tracing::instrument;

#[derive(Clone)]
pub struct ResultClient {
    inner: ResourceClient<MedicalResult>,
    registrations: RemoteResolver<RegistrationId, Registration>,
}

impl ResultClient {
    pub fn new(
        inner: ResourceClient<MedicalResult>,
        registrations: RemoteResolver<RegistrationId, Registration>,
    ) -> Self {
        Self {
            inner,
            registrations,
        }
    }

    /// The only read through which a client sees the content of their own result.
    #[instrument(skip(self, auth))]
    pub async fn find_view(&self, auth: &AuthContext, id: MedicalResultId) -> Result<ResultView, ServiceError> {
        self.authorize_read(auth)?;
        let result = self.fetch(id).await?;
        Ok(compose_for(result, &self.registrations, auth).await)
    }
}

impl ServiceClient<MedicalResult> for ResultClient {
    const SERVICE: &'static str = "result";
    const WRITE: Capability = Capability::WriteResults;

    fn inner(&self) -> &ResourceClient<MedicalResult> {
        &self.inner
    }
}
