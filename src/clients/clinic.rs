use crate::clients::views::DepartmentView;
use crate::model::{Department, DepartmentId, FacilityId, MedicalFacility};
use fleet_framework::{
    compose_for, AuthContext, Capability, RemoteResolver, ResourceClient, ServiceClient,
    ServiceError,
};
use tracing::instrument;

#[derive(Clone)]
pub struct DepartmentClient {
    inner: ResourceClient<Department>,
    facilities: RemoteResolver<FacilityId, MedicalFacility>,
}

impl DepartmentClient {
    pub fn new(inner: ResourceClient<Department>, facilities: RemoteResolver<FacilityId, MedicalFacility>) -> Self {
        Self { inner, facilities }
    }

    #[instrument(skip(self, auth))]
    pub async fn find_view(&self, auth: &AuthContext, id: DepartmentId) -> Result<DepartmentView, ServiceError> {
        self.authorize_read(auth)?;
        let department = self.fetch(id).await?;
        Ok(compose_for(department, &self.facilities, auth).await)
    }
}

impl ServiceClient<Department> for DepartmentClient {
    const SERVICE: &'static str = "department";
    const WRITE: Capability = Capability::ManageClinic;
    const PUBLIC_READ: bool = true;

    fn inner(&self) -> &ResourceClient<Department> {
        &self.inner
    }
}

#[derive(Clone)]
pub struct FacilityClient {
    inner: ResourceClient<MedicalFacility>,
}

impl FacilityClient {
    pub fn new(inner: ResourceClient<MedicalFacility>) -> Self {
        Self { inner }
    }
}

impl ServiceClient<MedicalFacility> for FacilityClient {
    const SERVICE: &'static str = "facility";
    const WRITE: Capability = Capability::ManageClinic;
    const PUBLIC_READ: bool = true;

    fn inner(&self) -> &ResourceClient<MedicalFacility> {
        &self.inner
    }
}
