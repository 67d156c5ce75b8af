//! Medical results written by doctors against a registration.

use crate::model::RegistrationId;
use fleet_framework::merge::merge_optional;
use fleet_framework::{define_id, AuthContext, Capability, Merge, Redact, Validate, Violations};
use serde::{Deserialize, Serialize};

define_id!(MedicalResult);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalResult {
    pub id: MedicalResultId,
    pub description: Option<String>,
    pub recommendations: Option<String>,
    pub registration: Option<RegistrationId>,
}

impl MedicalResult {
    pub fn new(id: MedicalResultId, params: ResultCreate) -> Self {
        Self {
            id,
            description: Some(params.description),
            recommendations: params.recommendations,
            registration: params.registration,
        }
    }

    pub fn strip_description(&mut self) {
        self.description = None;
        self.recommendations = None;
    }
}

impl Validate for MedicalResult {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(self.description.as_deref().unwrap_or_default(), "description");
        v
    }
}

impl Merge for MedicalResult {
    type Patch = ResultPatch;

    fn merge(&mut self, patch: ResultPatch) {
        merge_optional(&mut self.description, patch.description);
        merge_optional(&mut self.recommendations, patch.recommendations);
    }
}

/// Without the registration at hand the owning client is unknown, so only writers of
/// results see the content. [`ResultView`](crate::clients::ResultView) widens this for the
/// owning client.
impl Redact for MedicalResult {
    fn redact(mut self, auth: &AuthContext) -> Self {
        if !auth.can(Capability::WriteResults) {
            self.strip_description();
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCreate {
    pub description: String,
    pub recommendations: Option<String>,
    pub registration: Option<RegistrationId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPatch {
    pub description: Option<String>,
    pub recommendations: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultFilter {
    Registration(RegistrationId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_framework::Role;

    fn sample() -> MedicalResult {
        MedicalResult::new(
            MedicalResultId(1),
            ResultCreate {
                description: "normal sinus rhythm".into(),
                recommendations: Some("none".into()),
                registration: Some(RegistrationId(4)),
            },
        )
    }

    #[test]
    fn only_result_writers_see_the_content_of_a_bare_result() {
        let doctor = sample().redact(&AuthContext::new(2, Role::Doctor));
        assert!(doctor.description.is_some());

        let manager = sample().redact(&AuthContext::new(3, Role::TopManager));
        assert!(manager.description.is_none());
        assert!(manager.recommendations.is_none());
        assert_eq!(manager.registration, Some(RegistrationId(4)));
    }

    #[test]
    fn blank_description_after_merge_is_rejected() {
        let mut r = sample();
        r.merge(ResultPatch {
            description: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(r.validate().message(), "description must not be blank");
    }
}
