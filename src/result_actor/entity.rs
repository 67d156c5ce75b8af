//! [`OwnedEntity`] implementation for [`MedicalResult`].

use crate::model::{
    MedicalResult, MedicalResultId, Registration, RegistrationId, ResultCreate, ResultFilter,
    ResultPatch,
};
use async_trait::async_trait;
use fleet_framework::{ForeignKeyChecker, Merge, OwnedEntity, RemoteResolver, ServiceError, Validate};

#[derive(Clone)]
pub struct ResultContext {
    registrations: RemoteResolver<RegistrationId, Registration>,
}

impl ResultContext {
    pub fn new(registrations: RemoteResolver<RegistrationId, Registration>) -> Self {
        Self { registrations }
    }
}

#[async_trait]
impl OwnedEntity for MedicalResult {
    type Id = MedicalResultId;
    type Create = ResultCreate;
    type Patch = ResultPatch;
    type Filter = ResultFilter;
    type Action = ();
    type ActionResult = ();
    type Context = ResultContext;

    fn id(&self) -> &MedicalResultId {
        &self.id
    }

    fn from_create_params(id: MedicalResultId, params: ResultCreate) -> Result<Self, ServiceError> {
        Ok(MedicalResult::new(id, params))
    }

    fn matches(&self, filter: &ResultFilter) -> bool {
        match filter {
            ResultFilter::Registration(registration) => self.registration == Some(*registration),
        }
    }

    async fn on_create(&mut self, ctx: &ResultContext) -> Result<(), ServiceError> {
        let mut fk = ForeignKeyChecker::after(self.validate());
        fk.require("registration", "registration", self.registration, &ctx.registrations)
            .await?;
        fk.finish()
    }

    /// The registration of a result is fixed, so only the result's own fields are checked.
    async fn on_update(&mut self, patch: ResultPatch, _ctx: &ResultContext) -> Result<(), ServiceError> {
        self.merge(patch);
        self.validated()
    }

    async fn handle_action(&mut self, _action: (), _ctx: &ResultContext) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_framework::mock::MockClient;
    use fleet_framework::{FailureGate, FrameworkError, GateConfig, ResourceActor, ResourceClient};
    use std::sync::Arc;

    fn start(registrations: &MockClient<Registration>) -> ResourceClient<MedicalResult> {
        let gate = Arc::new(FailureGate::new("result->registration", GateConfig::default()));
        let (actor, results) = ResourceActor::new(8);
        tokio::spawn(actor.run(ResultContext::new(RemoteResolver::new(
            "registration",
            Arc::new(registrations.client()),
            gate,
        ))));
        results
    }

    #[tokio::test]
    async fn blank_description_and_missing_registration_aggregate() {
        let registrations = MockClient::new();
        let results = start(&registrations);
        let err = results
            .create(ResultCreate {
                description: "".into(),
                recommendations: None,
                registration: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Validation(ref m))
                if m == "description must not be blank; registration id is mandatory"
        ));
    }

    #[tokio::test]
    async fn result_for_a_deleted_registration_is_rejected() {
        let mut registrations = MockClient::new();
        let results = start(&registrations);
        registrations.expect_get(RegistrationId(5)).return_ok(None);
        let err = results
            .create(ResultCreate {
                description: "fine".into(),
                recommendations: None,
                registration: Some(RegistrationId(5)),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Service(ServiceError::Validation(ref m)) if m == "no registration with id 5"
        ));
        registrations.verify();
    }
}
