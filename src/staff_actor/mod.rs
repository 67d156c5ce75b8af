//! Staff service: owns [`Employee`] records (doctors, team managers, top managers).
//!
//! The staff service also keeps each department's doctor index current: creating, moving or
//! deleting a doctor updates the department through an explicit action.

pub mod entity;

pub use entity::StaffContext;

use crate::model::Employee;
use fleet_framework::{ResourceActor, ResourceClient};

pub fn new(capacity: usize) -> (ResourceActor<Employee>, ResourceClient<Employee>) {
    ResourceActor::new(capacity)
}
