//! # Clinic Fleet
//!
//! A fleet of clinic services built on [`fleet_framework`]. Each service owns one slice of the
//! domain in its own actor and refers to the others only by ID:
//!
//! | Service | Owns | References |
//! |---------|------|------------|
//! | [`client_actor`] | clients | |
//! | [`staff_actor`] | doctors, team managers, top managers | department, team members |
//! | [`clinic_actor`] | departments, medical facilities | facility |
//! | [`duty_actor`] | the duty catalogue | |
//! | [`registration_actor`] | bookings | duty, doctor, client |
//! | [`result_actor`] | medical results | registration |
//!
//! Writes check their foreign IDs against the owning service and fail with
//! `RemoteUnavailable` when that service cannot answer. Reads compose snapshots of the
//! referenced records and leave out whatever cannot be resolved.
//!
//! ## Module Tour
//!
//! ### 1. The Records ([`model`])
//! Entities, their create/patch documents, filters and actions, plus validation, merge and
//! redaction rules.
//!
//! ### 2. The Services (`*_actor`)
//! One [`OwnedEntity`](fleet_framework::OwnedEntity) impl per store. The context injected at
//! `run()` carries the resolvers, cascade rules and index links the service needs.
//!
//! ### 3. The Interface ([`clients`])
//! Typed clients per service with access control, error classification and composed views.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! [`ClinicFleet`](lifecycle::ClinicFleet) creates every actor, wires the contexts and shuts
//! them all down. [`FleetConfig`](lifecycle::FleetConfig) carries channel sizes, breaker
//! settings and peer URLs.
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -- --config fleet.toml
//! ```

pub mod client_actor;
pub mod clients;
pub mod clinic_actor;
pub mod duty_actor;
pub mod lifecycle;
pub mod model;
pub mod registration_actor;
pub mod result_actor;
pub mod staff_actor;
