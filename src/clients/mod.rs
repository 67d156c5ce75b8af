//! Typed clients: the inbound surface of each service.
//!
//! Each client wraps the raw [`ResourceClient`](fleet_framework::ResourceClient) of its
//! service and inherits the standard operations from
//! [`ServiceClient`](fleet_framework::ServiceClient). Services whose records reference other
//! services also hold the resolvers their composed views need.

pub mod client;
pub mod clinic;
pub mod duty;
pub mod registration;
pub mod result;
pub mod staff;
pub mod views;

pub use client::ClientServiceClient;
pub use clinic::{DepartmentClient, FacilityClient};
pub use duty::DutyClient;
pub use registration::RegistrationClient;
pub use result::ResultClient;
pub use staff::StaffClient;
pub use views::*;
