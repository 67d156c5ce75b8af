//! Result service: owns [`MedicalResult`] records written against a registration.

pub mod entity;

pub use entity::ResultContext;

use crate::model::MedicalResult;
use fleet_framework::{ResourceActor, ResourceClient};

pub fn new(capacity: usize) -> (ResourceActor<MedicalResult>, ResourceClient<MedicalResult>) {
    ResourceActor::new(capacity)
}
