//! Departments and the medical facilities that house them.
//!
//! The two sides of each association are one-directional ID sets: a department knows its
//! facility and its doctors by ID, a facility knows its departments by ID. The sets are
//! maintained explicitly through actions, never by walking an object graph.

use crate::model::client::{Address, AddressPatch};
use crate::model::EmployeeId;
use fleet_framework::merge::{merge_field, merge_nested, merge_optional};
use fleet_framework::{define_id, AuthContext, Merge, Redact, Validate, Violations};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

define_id!(Department);
define_id!(Facility);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub facility: Option<FacilityId>,
    #[serde(default)]
    pub doctor_ids: BTreeSet<EmployeeId>,
}

impl Department {
    pub fn new(id: DepartmentId, params: DepartmentCreate) -> Self {
        Self {
            id,
            name: params.name,
            facility: params.facility,
            doctor_ids: BTreeSet::new(),
        }
    }
}

impl Validate for Department {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.name, "name");
        v
    }
}

impl Merge for Department {
    type Patch = DepartmentPatch;

    fn merge(&mut self, patch: DepartmentPatch) {
        merge_field(&mut self.name, patch.name);
        merge_optional(&mut self.facility, patch.facility);
    }
}

impl Redact for Department {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCreate {
    pub name: String,
    pub facility: Option<FacilityId>,
}

/// Moving a department to another facility goes through a patch; leaving the facility goes
/// through [`DepartmentAction::ClearFacility`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub facility: Option<FacilityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DepartmentFilter {
    Facility(FacilityId),
    Name(String),
}

#[derive(Debug)]
pub enum DepartmentAction {
    AddDoctor(EmployeeId),
    RemoveDoctor(EmployeeId),
    ClearFacility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalFacility {
    pub id: FacilityId,
    pub name: String,
    pub address: Address,
    #[serde(default)]
    pub department_ids: BTreeSet<DepartmentId>,
}

impl MedicalFacility {
    pub fn new(id: FacilityId, params: FacilityCreate) -> Self {
        Self {
            id,
            name: params.name,
            address: params.address,
            department_ids: BTreeSet::new(),
        }
    }
}

impl Validate for MedicalFacility {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.name, "name");
        v.nested("address", self.address.validate());
        v
    }
}

impl Merge for MedicalFacility {
    type Patch = FacilityPatch;

    fn merge(&mut self, patch: FacilityPatch) {
        merge_field(&mut self.name, patch.name);
        merge_nested(&mut self.address, patch.address);
    }
}

impl Redact for MedicalFacility {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityCreate {
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityPatch {
    pub name: Option<String>,
    pub address: Option<AddressPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FacilityFilter {
    Name(String),
}

#[derive(Debug)]
pub enum FacilityAction {
    AddDepartment(DepartmentId),
    RemoveDepartment(DepartmentId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility() -> MedicalFacility {
        MedicalFacility::new(
            FacilityId(1),
            FacilityCreate {
                name: "Central".into(),
                address: Address {
                    city: "Gdansk".into(),
                    street: "Grunwaldzka".into(),
                    house_number: "12".into(),
                    postal_code: "80-200".into(),
                },
            },
        )
    }

    #[test]
    fn facility_patch_merges_the_address_field_by_field() {
        let mut f = facility();
        f.merge(FacilityPatch {
            address: Some(AddressPatch {
                house_number: Some("14".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(f.address.house_number, "14");
        assert_eq!(f.address.street, "Grunwaldzka");
        assert_eq!(f.name, "Central");
    }

    #[test]
    fn incomplete_facility_address_is_reported() {
        let mut f = facility();
        f.address.city = " ".into();
        f.address.postal_code = "abc".into();
        assert_eq!(
            f.validate().message(),
            "city must not be blank; postal code must be digits with an optional dash"
        );
    }

    #[test]
    fn doctor_index_serialises_as_a_sorted_list() {
        let mut d = Department::new(
            DepartmentId(2),
            DepartmentCreate {
                name: "Cardiology".into(),
                facility: None,
            },
        );
        d.doctor_ids.insert(EmployeeId(7));
        d.doctor_ids.insert(EmployeeId(3));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["doctorIds"], serde_json::json!([3, 7]));
        assert!(json["facility"].is_null());
    }
}
