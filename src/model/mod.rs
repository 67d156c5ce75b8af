//! Records owned by the services of the fleet, with their create, patch and filter types.
//!
//! Cross-service references are always plain IDs.

pub mod client;
pub mod clinic;
pub mod duty;
pub mod employee;
pub mod registration;
pub mod result;

pub use client::*;
pub use clinic::*;
pub use duty::*;
pub use employee::*;
pub use registration::*;
pub use result::*;
