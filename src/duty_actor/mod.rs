//! Duty service: owns the [`Duty`] catalogue.

pub mod entity;

pub use entity::DutyContext;

use crate::model::Duty;
use fleet_framework::{ResourceActor, ResourceClient};

pub fn new(capacity: usize) -> (ResourceActor<Duty>, ResourceClient<Duty>) {
    ResourceActor::new(capacity)
}
