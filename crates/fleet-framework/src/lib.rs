//! # Fleet Framework
//!
//! Building blocks for a fleet of services that each own one slice of a domain and refer to
//! each other's records only by ID. Each service's store runs as an actor; everything that
//! crosses a service boundary goes through the protocol pieces in this crate.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`OwnedEntity`]) - the records a service owns and their hooks
//! 2. **Runtime Layer** ([`ResourceActor`]) - sequential message processing over a private store
//! 3. **Interface Layer** ([`ResourceClient`], [`ServiceClient`]) - typed access, auth, error
//!    classification
//!
//! ## Cross-service protocol
//!
//! | Piece | Role |
//! |-------|------|
//! | [`FailureGate`] | closed / open / half-open breaker around every remote call |
//! | [`RemoteResolver`] | gated lookup of a foreign record; absorbs failures when composing |
//! | [`Violations`] | collects every constraint violation into one message |
//! | [`ForeignKeyChecker`] | "does this foreign ID exist?", escalating unreachable peers |
//! | [`merge`] | field-by-field partial updates |
//! | [`CascadeCoordinator`] | detaches or restricts dependents before a delete |
//! | [`IndexLink`] | keeps a peer's ID set in step with a committed write |
//! | [`Compose`] / [`Redact`] | best-effort views, redacted per caller |
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via the `run()` method, not at construction time.
//! Every actor is created first, so every client exists before any actor starts; the context
//! handed to `run()` can then hold clients of peers that in turn hold clients back. Cyclic peer
//! graphs are fine, which is also why actors stop on an explicit
//! [`ResourceRequest::Shutdown`] rather than when the last client is dropped.
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task and processes messages **sequentially**
//! - Different services run in **parallel**
//! - The only shared mutable state is each dependency's breaker, behind a mutex and atomics
//! - Remote calls are bounded by the gate's call timeout, so an actor waiting on a peer that
//!   is waiting on it gives up instead of hanging
//!
//! ## Testing
//!
//! [`mock::MockClient`] scripts the answers of a peer so one service can be tested alone.

pub mod actor;
pub mod auth;
pub mod cascade;
pub mod client;
pub mod client_trait;
pub mod compose;
pub mod entity;
pub mod error;
pub mod foreign_key;
pub mod gate;
pub mod http_peer;
pub mod id;
pub mod index;
pub mod merge;
pub mod message;
pub mod mock;
pub mod resolver;
pub mod validation;

#[cfg(test)]
mod testing;

#[doc(hidden)]
pub use paste;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use auth::{AuthContext, Capability, Principal, Role};
pub use cascade::{CascadeCoordinator, CascadePolicy, CascadeReport, DependentStore, ReferenceField};
pub use client::ResourceClient;
pub use client_trait::ServiceClient;
pub use compose::{compose_all, compose_for, Compose, Redact};
pub use entity::OwnedEntity;
pub use error::{AccessDenied, ErrorBody, FrameworkError, ServiceError};
pub use foreign_key::ForeignKeyChecker;
pub use gate::{BreakerState, FailureGate, GateConfig, GateError, GateRegistry, GateStats};
pub use http_peer::HttpPeer;
pub use index::IndexLink;
pub use merge::{CollectionPatch, Merge};
pub use message::{ResourceRequest, Response};
pub use resolver::{PeerError, PeerLookup, RemoteResolver};
pub use validation::{Validate, Violations};
