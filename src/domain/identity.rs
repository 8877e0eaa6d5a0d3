//! Caller identity and roles

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles a caller can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Cross-tenant operator; never bound to an organization
    Owner,
    Admin,
    Manager,
    Viewer,
    Driver,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Owner,
        Role::Admin,
        Role::Manager,
        Role::Viewer,
        Role::Driver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
            Role::Driver => "driver",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "viewer" => Ok(Role::Viewer),
            "driver" => Ok(Role::Driver),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller as supplied by the identity provider
///
/// `organization_id` is absent for owners and present for every other role,
/// except for the unscoped admin variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
}

impl Identity {
    pub fn new(id: Uuid, role: Role, organization_id: Option<Uuid>) -> Self {
        Self {
            id,
            role,
            organization_id,
        }
    }

    pub fn owner() -> Self {
        Self::new(Uuid::new_v4(), Role::Owner, None)
    }

    pub fn member(role: Role, organization_id: Uuid) -> Self {
        Self::new(Uuid::new_v4(), role, Some(organization_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Driver).unwrap(), "\"driver\"");
    }

    #[test]
    fn test_identity_constructors() {
        let owner = Identity::owner();
        assert_eq!(owner.role, Role::Owner);
        assert!(owner.organization_id.is_none());

        let org = Uuid::new_v4();
        let driver = Identity::member(Role::Driver, org);
        assert_eq!(driver.organization_id, Some(org));
    }
}
