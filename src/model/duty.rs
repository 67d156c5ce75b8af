//! Catalogue of medical services a clinic offers.

use fleet_framework::merge::{merge_field, merge_optional};
use fleet_framework::{define_id, AuthContext, Merge, Redact, Validate, Violations};
use serde::{Deserialize, Serialize};

define_id!(Duty);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duty {
    pub id: DutyId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub active: bool,
}

impl Duty {
    pub fn new(id: DutyId, params: DutyCreate) -> Self {
        Self {
            id,
            name: params.name,
            description: params.description,
            price: params.price,
            active: true,
        }
    }
}

impl Validate for Duty {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.name, "name");
        v.check(
            self.price.is_finite() && self.price > 0.0,
            "price",
            "price must be greater than 0",
        );
        v
    }
}

impl Merge for Duty {
    type Patch = DutyPatch;

    fn merge(&mut self, patch: DutyPatch) {
        merge_field(&mut self.name, patch.name);
        merge_optional(&mut self.description, patch.description);
        merge_field(&mut self.price, patch.price);
    }
}

impl Redact for Duty {
    fn redact(self, _auth: &AuthContext) -> Self {
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DutyFilter {
    Name(String),
    Active(bool),
}

#[derive(Debug)]
pub enum DutyAction {
    SetActive(bool),
}
