//! A client's booking of a duty with a doctor.
//!
//! All three references are plain IDs. `duty` may be cleared when the duty is withdrawn from
//! the catalogue; `doctor` and `client` are mandatory and fixed once checked.

use crate::model::{ClientId, DutyId, EmployeeId};
use chrono::{DateTime, Utc};
use fleet_framework::merge::{merge_field, merge_optional};
use fleet_framework::{define_id, AuthContext, Redact};
use serde::{Deserialize, Serialize};

define_id!(Registration);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: RegistrationId,
    pub duty: Option<DutyId>,
    pub doctor: Option<EmployeeId>,
    pub client: Option<ClientId>,
    pub start: DateTime<Utc>,
    pub active: bool,
}

impl Registration {
    pub fn new(id: RegistrationId, params: RegistrationCreate) -> Self {
        Self {
            id,
            duty: params.duty,
            doctor: params.doctor,
            client: params.client,
            start: params.start,
            active: true,
        }
    }

    /// Returns the references the patch changed, for re-checking.
    pub fn merge(&mut self, patch: RegistrationPatch) -> ChangedReferences {
        let changed = ChangedReferences {
            duty: patch.duty.filter(|d| self.duty != Some(*d)),
            doctor: patch.doctor.filter(|d| self.doctor != Some(*d)),
        };
        merge_optional(&mut self.duty, patch.duty);
        merge_optional(&mut self.doctor, patch.doctor);
        merge_field(&mut self.start, patch.start);
        changed
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangedReferences {
    pub duty: Option<DutyId>,
    pub doctor: Option<EmployeeId>,
}

impl Redact for Registration {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCreate {
    pub duty: Option<DutyId>,
    pub doctor: Option<EmployeeId>,
    pub client: Option<ClientId>,
    pub start: DateTime<Utc>,
}

/// The client of a registration never changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPatch {
    pub duty: Option<DutyId>,
    pub doctor: Option<EmployeeId>,
    pub start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationFilter {
    Duty(DutyId),
    Doctor(EmployeeId),
    Client(ClientId),
    Active(bool),
}

#[derive(Debug)]
pub enum RegistrationAction {
    /// The duty was withdrawn; keep the registration without it.
    ClearDuty,
    SetActive(bool),
}
