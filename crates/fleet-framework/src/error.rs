//! # Errors
//!
//! Two layers of errors live here:
//!
//! - [`FrameworkError`] is what the actor plumbing reports: a closed or dropped channel, a
//!   missing record, a unique-key collision, or an error raised by an entity hook.
//! - [`ServiceError`] is the taxonomy every service speaks at its boundary. Each variant has a
//!   fixed HTTP status (see [`ServiceError::status`]) and renders into an [`ErrorBody`].
//!
//! Typed clients convert the former into the latter exactly once, in
//! [`ServiceError::classify`], which is also where the failure gets logged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use tracing::warn;

/// Errors that can occur within the actor runtime itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Why a caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    Unauthenticated,
    #[error("access denied")]
    Forbidden,
}

/// The error taxonomy shared by every service in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Local constraints failed or a referenced foreign ID is confirmed absent.
    #[error("{0}")]
    Validation(String),

    /// Unique-key collision, or a delete blocked by dependents.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The breaker is open or the remote call failed for infrastructure reasons.
    /// Changing the request will not help; retrying later might.
    #[error("remote service '{dependency}' unavailable: {reason}")]
    RemoteUnavailable { dependency: String, reason: String },

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl ServiceError {
    pub fn remote(dependency: impl Into<String>, reason: impl Display) -> Self {
        Self::RemoteUnavailable {
            dependency: dependency.into(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status this error is surfaced with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Conflict(_) => 400,
            Self::AccessDenied(AccessDenied::Unauthenticated) => 401,
            Self::AccessDenied(AccessDenied::Forbidden) => 403,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::RemoteUnavailable { .. } => 500,
        }
    }

    /// `true` when the client can fix the problem by changing the request.
    pub fn is_client_fixable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound(_) | Self::MethodNotAllowed(_)
        )
    }

    /// The `error` field of the response body. Validation, conflict and not-found errors
    /// carry their message; infrastructure and access errors a fixed classification.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Conflict(message) | Self::NotFound(message) => {
                message.clone()
            }
            Self::RemoteUnavailable { .. } => "remote service unavailable".to_string(),
            Self::AccessDenied(AccessDenied::Unauthenticated) => "unauthorized".to_string(),
            Self::AccessDenied(AccessDenied::Forbidden) => "forbidden".to_string(),
            Self::MethodNotAllowed(_) => "method not allowed".to_string(),
        }
    }

    pub fn to_body(&self, path: impl Into<String>) -> ErrorBody {
        ErrorBody {
            timestamp: Utc::now(),
            status: self.status(),
            error: self.public_message(),
            path: path.into(),
        }
    }

    /// Maps an actor-level failure of `operation` on `target` into the service taxonomy
    /// and logs it. `service` names the store that answered (or failed to).
    pub fn classify(
        service: &str,
        operation: &'static str,
        target: &dyn Display,
        error: FrameworkError,
    ) -> Self {
        let classified = match error {
            FrameworkError::NotFound(_) => {
                Self::NotFound(format!("no {service} with id {target}"))
            }
            FrameworkError::Conflict(key) => {
                Self::Conflict(format!("{service} with {key} already exists"))
            }
            FrameworkError::ActorClosed => Self::remote(service, "actor closed"),
            FrameworkError::ActorDropped => Self::remote(service, "response channel dropped"),
            FrameworkError::Service(inner) => inner,
        };
        warn!(
            service,
            operation,
            target = %target,
            status = classified.status(),
            error = %classified,
            "Request rejected"
        );
        classified
    }
}

/// JSON error body: `{ timestamp, status, error, path }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        assert_eq!(ServiceError::Validation("x".into()).status(), 400);
        assert_eq!(ServiceError::Conflict("x".into()).status(), 400);
        assert_eq!(ServiceError::NotFound("x".into()).status(), 404);
        assert_eq!(ServiceError::from(AccessDenied::Unauthenticated).status(), 401);
        assert_eq!(ServiceError::from(AccessDenied::Forbidden).status(), 403);
        assert_eq!(ServiceError::MethodNotAllowed("x".into()).status(), 405);
        assert_eq!(ServiceError::remote("clinic", "down").status(), 500);
    }

    #[test]
    fn remote_failures_hide_their_cause_from_the_body() {
        let body = ServiceError::remote("clinic", "connection refused").to_body("/doctors");
        assert_eq!(body.status, 500);
        assert_eq!(body.error, "remote service unavailable");
        assert_eq!(body.path, "/doctors");
    }

    #[test]
    fn classify_keeps_entity_errors_and_maps_plumbing() {
        let kept = ServiceError::classify(
            "duty",
            "create",
            &1,
            FrameworkError::Service(ServiceError::Validation("name must not be blank".into())),
        );
        assert_eq!(kept, ServiceError::Validation("name must not be blank".into()));

        let missing = ServiceError::classify("duty", "get", &7, FrameworkError::NotFound("7".into()));
        assert_eq!(missing, ServiceError::NotFound("no duty with id 7".into()));

        let closed = ServiceError::classify("duty", "get", &7, FrameworkError::ActorClosed);
        assert!(matches!(closed, ServiceError::RemoteUnavailable { ref dependency, .. } if dependency == "duty"));
        assert!(!closed.is_client_fixable());
    }
}
