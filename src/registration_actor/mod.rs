//! Registration service: owns [`Registration`] records, the bookings that tie a client, a
//! doctor and a duty together.

pub mod entity;

pub use entity::RegistrationContext;

use crate::model::Registration;
use fleet_framework::{ResourceActor, ResourceClient};

pub fn new(capacity: usize) -> (ResourceActor<Registration>, ResourceClient<Registration>) {
    ResourceActor::new(capacity)
}
