//! # Foreign Key Checks
//!
//! Confirms that foreign IDs embedded in a write exist at the owning service.
//!
//! | reference | outcome |
//! |-----------|---------|
//! | missing (`None`) where mandatory | violation `"<field> ID is mandatory"` |
//! | peer says absent | violation `"no <entity> with id <id>"` |
//! | peer unreachable / breaker open | `Err(RemoteUnavailable)` immediately |
//!
//! Violations accumulate with the record's own constraint violations so the caller still
//! raises exactly one validation error. An unreachable peer is never turned into a validation
//! failure: the writer cannot tell whether the reference is valid.

use crate::error::ServiceError;
use crate::resolver::RemoteResolver;
use crate::validation::Violations;
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ForeignKeyChecker {
    violations: Violations,
}

impl ForeignKeyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues from constraint violations already collected for the record.
    pub fn after(violations: Violations) -> Self {
        Self { violations }
    }

    /// Checks a mandatory reference and hands back the snapshot when it resolved.
    pub async fn require<Id, T>(
        &mut self,
        field: &str,
        entity: &str,
        id: Option<Id>,
        resolver: &RemoteResolver<Id, T>,
    ) -> Result<Option<T>, ServiceError>
    where
        Id: Display + Clone + Send + Sync + 'static,
        T: Send + 'static,
    {
        match id {
            Some(id) => self.check(entity, id, resolver).await,
            None => {
                self.violations.push(field, format!("{field} ID is mandatory"));
                Ok(None)
            }
        }
    }

    /// Checks a reference that may be left empty.
    pub async fn optional<Id, T>(
        &mut self,
        entity: &str,
        id: Option<Id>,
        resolver: &RemoteResolver<Id, T>,
    ) -> Result<Option<T>, ServiceError>
    where
        Id: Display + Clone + Send + Sync + 'static,
        T: Send + 'static,
    {
        match id {
            Some(id) => self.check(entity, id, resolver).await,
            None => Ok(None),
        }
    }

    pub async fn check<Id, T>(
        &mut self,
        entity: &str,
        id: Id,
        resolver: &RemoteResolver<Id, T>,
    ) -> Result<Option<T>, ServiceError>
    where
        Id: Display + Clone + Send + Sync + 'static,
        T: Send + 'static,
    {
        let found = resolver.lookup(id.clone()).await?;
        debug!(dependency = resolver.dependency(), %id, found = found.is_some(), "Foreign key");
        if found.is_none() {
            self.violations.push(entity, format!("no {entity} with id {id}"));
        }
        Ok(found)
    }

    /// Adds a violation found while inspecting a resolved snapshot (wrong kind, inactive…).
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(field, message);
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    /// One aggregated [`ServiceError::Validation`] if anything failed.
    pub fn finish(self) -> Result<(), ServiceError> {
        self.violations.into_result()
    }
}

/// `exists(ownerService, id)`; an unreachable owner is an error, not `false`.
pub async fn exists<Id, T>(resolver: &RemoteResolver<Id, T>, id: Id) -> Result<bool, ServiceError>
where
    Id: Display + Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    Ok(resolver.lookup(id).await?.is_some())
}
