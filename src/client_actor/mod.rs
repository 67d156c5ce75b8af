//! Client service: owns [`Client`] records.
//!
//! Nothing the client service stores points elsewhere, but registrations point at clients,
//! so a client with registrations cannot be deleted.

pub mod entity;

pub use entity::ClientContext;

use crate::model::Client;
use fleet_framework::{ResourceActor, ResourceClient};

/// Creates the client actor and the raw client the rest of the fleet talks to it through.
pub fn new(capacity: usize) -> (ResourceActor<Client>, ResourceClient<Client>) {
    ResourceActor::new(capacity)
}
