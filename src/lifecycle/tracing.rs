//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
//! Module paths are hidden (`with_target(false)`); the structured fields carry the context
//! instead: `entity_type` and `id` on actor operations, `dependency` and `state` on breaker
//! transitions.
//!
//! ```bash
//! RUST_LOG=info cargo run                     # state changes, rejected writes, open breakers
//! RUST_LOG=debug cargo run                    # request payloads and every remote lookup
//! RUST_LOG=fleet_framework::gate=debug cargo run
//! ```
//!
//! A registration composed while the client service is down reads like this at `info`:
//!
//! ```text
//! WARN find_view{id=RegistrationId(3)}: Resolution failed, leaving it out dependency="client" id=3 error=remote service 'client' unavailable: circuit 'registration->client' is open (failing fast)
//! ```

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
