//! Clients of the clinic and their personal data.
//!
//! `Client` implements [`OwnedEntity`](fleet_framework::OwnedEntity) in
//! [`client_actor`](crate::client_actor).

use fleet_framework::merge::{merge_field, merge_nested, merge_nested_optional, merge_optional};
use fleet_framework::validation::{is_email, is_postal_code};
use fleet_framework::{define_id, AuthContext, Capability, Merge, Redact, Validate, Violations};
use serde::{Deserialize, Serialize};

define_id!(Client);

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub city: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
}

impl Merge for Address {
    type Patch = AddressPatch;

    fn merge(&mut self, patch: AddressPatch) {
        merge_field(&mut self.city, patch.city);
        merge_field(&mut self.street, patch.street);
        merge_field(&mut self.house_number, patch.house_number);
        merge_field(&mut self.postal_code, patch.postal_code);
    }
}

impl Validate for Address {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.city, "city");
        v.require_text(&self.street, "street");
        v.require_text(&self.house_number, "house number");
        v.check(
            is_postal_code(&self.postal_code),
            "postalCode",
            "postal code must be digits with an optional dash",
        );
        v
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDataPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressPatch>,
}

impl Merge for PersonalData {
    type Patch = PersonalDataPatch;

    fn merge(&mut self, patch: PersonalDataPatch) {
        merge_field(&mut self.first_name, patch.first_name);
        merge_field(&mut self.last_name, patch.last_name);
        merge_optional(&mut self.phone, patch.phone);
        merge_nested_optional(&mut self.address, patch.address);
    }
}

impl Validate for PersonalData {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require_text(&self.first_name, "first name");
        v.require_text(&self.last_name, "last name");
        match &self.address {
            Some(address) => v.nested("address", address.validate()),
            None => v.push("address", "address is required"),
        }
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub email: String,
    /// Never leaves the service: skipped on the wire and blanked by [`Redact`].
    #[serde(skip_serializing, default)]
    pub password: String,
    pub enabled: bool,
    pub personal_data: PersonalData,
}

impl Client {
    pub fn new(id: ClientId, params: ClientCreate) -> Self {
        Self {
            id,
            email: params.email,
            password: params.password,
            enabled: true,
            personal_data: params.personal_data,
        }
    }
}

impl Validate for Client {
    fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.check(is_email(&self.email), "email", "email must be a valid address");
        v.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
        v.extend(self.personal_data.validate());
        v
    }
}

impl Merge for Client {
    type Patch = ClientPatch;

    fn merge(&mut self, patch: ClientPatch) {
        merge_field(&mut self.email, patch.email);
        merge_field(&mut self.password, patch.password);
        merge_nested(&mut self.personal_data, patch.personal_data);
    }
}

impl Redact for Client {
    fn redact(mut self, auth: &AuthContext) -> Self {
        self.password.clear();
        if !auth.can(Capability::ViewSensitive) && !auth.is_client(self.id.0) {
            self.personal_data.phone = None;
            self.personal_data.address = None;
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCreate {
    pub email: String,
    pub password: String,
    pub personal_data: PersonalData,
}

/// Partial update; `None` leaves the stored value. `enabled` changes through the status
/// endpoint only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub personal_data: Option<PersonalDataPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientFilter {
    Email(String),
    Enabled(bool),
}

#[derive(Debug)]
pub enum ClientAction {
    SetEnabled(bool),
}
