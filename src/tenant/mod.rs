//! Tenant context resolution
//!
//! A request's visibility is decided once, from the authenticated
//! [`Identity`], and carried explicitly as an [`AccessScope`] to every
//! repository call. Nothing below this module inspects raw identity fields
//! to decide what a caller may see.

pub mod query;

pub use query::{
    apply_scope, Comparison, LogicalQuery, Predicate, ScopedQuery, SortOrder, SqlValue, TenantScoped,
};

use crate::domain::{Identity, Role};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Set of organizations a request may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "organization_id", rename_all = "snake_case")]
pub enum AccessScope {
    AllOrganizations,
    Organization(Uuid),
}

impl AccessScope {
    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            AccessScope::AllOrganizations => None,
            AccessScope::Organization(id) => Some(*id),
        }
    }

    pub fn is_unscoped(&self) -> bool {
        matches!(self, AccessScope::AllOrganizations)
    }

    /// Guard for writes keyed by an explicit organization id
    pub fn authorize_organization(&self, organization_id: Uuid) -> Result<()> {
        match self {
            AccessScope::AllOrganizations => Ok(()),
            AccessScope::Organization(id) if *id == organization_id => Ok(()),
            AccessScope::Organization(_) => Err(AppError::AuthorizationDenied(
                "Organization is outside of your access scope".to_string(),
            )),
        }
    }

    /// Organization a write lands in.
    ///
    /// Scoped callers write into their own organization; an explicit id that
    /// differs is rejected. Unscoped callers must name the organization.
    pub fn resolve_target(&self, explicit: Option<Uuid>) -> Result<Uuid> {
        match (self, explicit) {
            (AccessScope::Organization(id), None) => Ok(*id),
            (AccessScope::Organization(_), Some(requested)) => {
                self.authorize_organization(requested)?;
                Ok(requested)
            }
            (AccessScope::AllOrganizations, Some(requested)) => Ok(requested),
            (AccessScope::AllOrganizations, None) => Err(AppError::validation(
                "organization_id",
                "organization_id is required for callers without an organization",
            )),
        }
    }
}

/// Identity plus its resolved scope, built once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    identity: Identity,
    scope: AccessScope,
}

impl TenantContext {
    /// Derive the access scope of an identity.
    pub fn resolve(identity: Identity) -> Result<Self> {
        let scope = match (identity.role, identity.organization_id) {
            (Role::Owner, organization_id) => {
                if organization_id.is_some() {
                    tracing::warn!(
                        identity_id = %identity.id,
                        "Owner identity carries an organization reference; treating as unscoped"
                    );
                }
                AccessScope::AllOrganizations
            }
            (Role::Admin, None) => AccessScope::AllOrganizations,
            (_, Some(organization_id)) => AccessScope::Organization(organization_id),
            (role, None) => {
                tracing::warn!(
                    identity_id = %identity.id,
                    role = %role,
                    "Identity has no organization reference"
                );
                return Err(AppError::AuthorizationDenied(format!(
                    "Role '{}' requires an organization",
                    role
                )));
            }
        };

        Ok(Self { identity, scope })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn actor_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_owner_is_unscoped() {
        let ctx = TenantContext::resolve(Identity::owner()).unwrap();
        assert_eq!(ctx.scope(), &AccessScope::AllOrganizations);
    }

    #[test]
    fn test_owner_with_stray_organization_is_still_unscoped() {
        let identity = Identity::new(Uuid::new_v4(), Role::Owner, Some(Uuid::new_v4()));
        let ctx = TenantContext::resolve(identity).unwrap();
        assert!(ctx.scope().is_unscoped());
    }

    #[test]
    fn test_admin_without_organization_is_unscoped() {
        let identity = Identity::new(Uuid::new_v4(), Role::Admin, None);
        let ctx = TenantContext::resolve(identity).unwrap();
        assert_eq!(ctx.scope(), &AccessScope::AllOrganizations);
    }

    #[rstest]
    #[case(Role::Admin)]
    #[case(Role::Manager)]
    #[case(Role::Viewer)]
    #[case(Role::Driver)]
    fn test_members_are_confined_to_their_organization(#[case] role: Role) {
        let org = Uuid::new_v4();
        let ctx = TenantContext::resolve(Identity::member(role, org)).unwrap();
        assert_eq!(ctx.scope(), &AccessScope::Organization(org));
        assert!(!ctx.scope().is_unscoped());
    }

    #[rstest]
    #[case(Role::Manager)]
    #[case(Role::Viewer)]
    #[case(Role::Driver)]
    fn test_members_without_organization_are_denied(#[case] role: Role) {
        let identity = Identity::new(Uuid::new_v4(), role, None);
        let err = TenantContext::resolve(identity).unwrap_err();
        assert!(matches!(err, AppError::AuthorizationDenied(_)));
    }

    #[test]
    fn test_authorize_organization() {
        let org = Uuid::new_v4();
        let scope = AccessScope::Organization(org);
        assert!(scope.authorize_organization(org).is_ok());
        assert!(matches!(
            scope.authorize_organization(Uuid::new_v4()),
            Err(AppError::AuthorizationDenied(_))
        ));
        assert!(AccessScope::AllOrganizations
            .authorize_organization(Uuid::new_v4())
            .is_ok());
    }

    #[test]
    fn test_resolve_target() {
        let org = Uuid::new_v4();
        let scoped = AccessScope::Organization(org);
        assert_eq!(scoped.resolve_target(None).unwrap(), org);
        assert_eq!(scoped.resolve_target(Some(org)).unwrap(), org);
        assert!(scoped.resolve_target(Some(Uuid::new_v4())).is_err());

        let other = Uuid::new_v4();
        assert_eq!(
            AccessScope::AllOrganizations
                .resolve_target(Some(other))
                .unwrap(),
            other
        );
        let err = AccessScope::AllOrganizations
            .resolve_target(None)
            .unwrap_err();
        assert_eq!(err.field(), Some("organization_id"));
    }
}
