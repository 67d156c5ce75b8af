//! Clinic service: owns [`Department`] and [`MedicalFacility`] records.
//!
//! A department refers to its facility by ID; the facility keeps the matching department-ID
//! set, maintained by the department side after every committed write.

pub mod department;
pub mod facility;

pub use department::DepartmentContext;
pub use facility::FacilityContext;

use crate::model::{Department, MedicalFacility};
use fleet_framework::{ResourceActor, ResourceClient};

pub fn departments(capacity: usize) -> (ResourceActor<Department>, ResourceClient<Department>) {
    ResourceActor::new(capacity)
}

pub fn facilities(capacity: usize) -> (ResourceActor<MedicalFacility>, ResourceClient<MedicalFacility>) {
    ResourceActor::new(capacity)
}
