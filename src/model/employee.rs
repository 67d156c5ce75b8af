//! Clinic staff as one tagged variant over a shared base record.
//!
//! The role tag is fixed at creation. Role-specific questions ("does this employee belong to
//! a department?") are plain functions over [`StaffRole`].

use crate::model::DepartmentId;
use fleet_framework::merge::{merge_field, merge_optional};
use fleet_framework::validation::is_email;
use fleet_framework::{define_id, AuthContext, CollectionPatch, Redact, Validate, Violations};
use serde::{Deserialize, Serialize};

define_id!(Employee);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeKind {
    Doctor,
    TeamManager,
    TopManager,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBase {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    #[serde(rename_all = "camelCase")]
    Doctor {
        department: Option<DepartmentId>,
        specialization: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TeamManager {
        department: Option<DepartmentId>,
        team: Vec<EmployeeId>,
    },
    TopManager,
}

impl StaffRole {
    pub fn kind(&self) -> EmployeeKind {
        match self {
            StaffRole::Doctor { .. } => EmployeeKind::Doctor,
            StaffRole::TeamManager { .. } => EmployeeKind::TeamManager,
            StaffRole::TopManager => EmployeeKind::TopManager,
        }
    }

    /// Doctors and team managers must belong to a department.
    pub fn needs_department(&self) -> bool {
        !matches!(self, StaffRole::TopManager)
    }

    pub fn department(&self) -> Option<DepartmentId> {
        match self {
            StaffRole::Doctor { department, .. } | StaffRole::TeamManager { department, .. } => {
                *department
            }
            StaffRole::TopManager => None,
        }
    }

    pub fn team(&self) -> &[EmployeeId] {
        match self {
            StaffRole::TeamManager { team, .. } => team,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(flatten)]
    pub base: EmployeeBase,
    #[serde(flatten)]
    pub role: StaffRole,
}

impl Employee {
    pub fn new(id: EmployeeId, params: EmployeeCreate) -> Self {
        Self {
            id,
            base: EmployeeBase {
                first_name: params.first_name,
                last_name: params.last_name,
                email: params.email,
                active: true,
            },
            role: params.role,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role.kind() == EmployeeKind::Doctor
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.base.first_name, self.base.last_name)
    }

    /// Field-by-field merge. A department or team change on a role that has none is ignored.
    pub fn merge(&mut self, patch: EmployeePatch) {
        merge_field(&mut self.base.first_name, patch.first_name);
        merge_field(&mut self.base.last_name, patch.last_name);
        merge_field(&mut self.base.email, patch.email);
        match &mut self.role {
            StaffRole::Doctor {
                department,
                specialization,
            } => {
                merge_optional(department, patch.department);
                merge_optional(specialization, patch.specialization);
            }
            StaffRole::TeamManager { department, team } => {
                merge_optional(department, patch.department);
                patch.team.apply(team);
            }
            StaffRole::TopManager => {}
        }
    }
}

impl Validate for Employee {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.base.first_name, "first name");
        v.require_text(&self.base.last_name, "last name");
        v.check(is_email(&self.base.email), "email", "email must be a valid address");
        if let StaffRole::TeamManager { team, .. } = &self.role {
            v.check(!team.contains(&self.id), "team", "a team manager cannot be in their own team");
        }
        v
    }
}

impl Redact for Employee {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(flatten)]
    pub role: StaffRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<DepartmentId>,
    pub specialization: Option<String>,
    #[serde(default)]
    pub team: CollectionPatch<EmployeeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmployeeFilter {
    Kind(EmployeeKind),
    Department(DepartmentId),
    Active(bool),
}

#[derive(Debug)]
pub enum EmployeeAction {
    SetActive(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Employee {
        Employee::new(
            EmployeeId(3),
            EmployeeCreate {
                first_name: "Ewa".into(),
                last_name: "Lis".into(),
                email: "ewa@clinic.org".into(),
                role: StaffRole::TeamManager {
                    department: Some(DepartmentId(1)),
                    team: vec![EmployeeId(1), EmployeeId(2)],
                },
            },
        )
    }

    #[test]
    fn empty_team_in_a_patch_changes_nothing() {
        let mut m = manager();
        m.merge(EmployeePatch {
            team: CollectionPatch::Replace(vec![]),
            last_name: Some("Lisowska".into()),
            ..Default::default()
        });
        assert_eq!(m.role.team(), &[EmployeeId(1), EmployeeId(2)]);
        assert_eq!(m.base.last_name, "Lisowska");

        m.merge(EmployeePatch {
            team: CollectionPatch::Clear,
            ..Default::default()
        });
        assert!(m.role.team().is_empty());
    }

    #[test]
    fn team_is_cleared_from_a_json_patch() {
        let patch: EmployeePatch =
            serde_json::from_value(serde_json::json!({ "team": { "clear": true } })).unwrap();
        let mut m = manager();
        m.merge(patch);
        assert!(m.role.team().is_empty());

        let patch: EmployeePatch = serde_json::from_value(serde_json::json!({ "team": [] })).unwrap();
        let mut m = manager();
        m.merge(patch);
        assert_eq!(m.role.team(), &[EmployeeId(1), EmployeeId(2)]);
    }

    #[test]
    fn role_specific_questions_are_plain_functions() {
        let m = manager();
        assert!(m.role.needs_department());
        assert_eq!(m.role.department(), Some(DepartmentId(1)));
        assert!(!m.is_doctor());
        assert!(!StaffRole::TopManager.needs_department());
    }

    #[test]
    fn wire_form_carries_the_role_tag() {
        let json = serde_json::to_value(manager()).unwrap();
        assert_eq!(json["role"], "TEAM_MANAGER");
        assert_eq!(json["firstName"], "Ewa");
        assert_eq!(json["team"], serde_json::json!([1, 2]));

        let back: Employee = serde_json::from_value(json).unwrap();
        assert_eq!(back, manager());
    }
}
