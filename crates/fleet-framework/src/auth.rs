//! Explicit authentication context, passed into every client call.

use crate::error::AccessDenied;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    TopManager,
    TeamManager,
    Doctor,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageClients,
    ManageStaff,
    ManageClinic,
    ManageCatalog,
    ManageRegistrations,
    WriteResults,
    ViewSensitive,
}

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                ManageClients,
                ManageStaff,
                ManageClinic,
                ManageCatalog,
                ManageRegistrations,
                WriteResults,
                ViewSensitive,
            ],
            Role::TopManager => &[
                ManageStaff,
                ManageClinic,
                ManageCatalog,
                ManageRegistrations,
                ViewSensitive,
            ],
            Role::TeamManager => &[ManageRegistrations, ViewSensitive],
            Role::Doctor => &[ManageRegistrations, WriteResults, ViewSensitive],
            Role::Client => &[],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Client)
    }
}

/// Who is calling. `id` is the caller's own client or employee ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: u32,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthContext {
    principal: Option<Principal>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn new(id: u32, role: Role) -> Self {
        Self {
            principal: Some(Principal { id, role }),
        }
    }

    pub fn admin() -> Self {
        Self::new(0, Role::Admin)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn authenticated(&self) -> Result<&Principal, AccessDenied> {
        self.principal.as_ref().ok_or(AccessDenied::Unauthenticated)
    }

    pub fn require(&self, capability: Capability) -> Result<&Principal, AccessDenied> {
        let principal = self.authenticated()?;
        if principal.role.can(capability) {
            Ok(principal)
        } else {
            Err(AccessDenied::Forbidden)
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.principal.is_some_and(|p| p.role.can(capability))
    }

    /// `true` when the caller is the given client.
    pub fn is_client(&self, client_id: u32) -> bool {
        self.principal
            .is_some_and(|p| p.role == Role::Client && p.id == client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_principal_and_missing_capability_differ() {
        assert_eq!(
            AuthContext::anonymous().require(Capability::ManageCatalog),
            Err(AccessDenied::Unauthenticated)
        );
        assert_eq!(
            AuthContext::new(3, Role::Client).require(Capability::ManageCatalog),
            Err(AccessDenied::Forbidden)
        );
        assert!(AuthContext::new(1, Role::TopManager)
            .require(Capability::ManageCatalog)
            .is_ok());
    }

    #[test]
    fn only_the_matching_client_is_self() {
        let auth = AuthContext::new(7, Role::Client);
        assert!(auth.is_client(7));
        assert!(!auth.is_client(8));
        assert!(!AuthContext::new(7, Role::Doctor).is_client(7));
    }
}
