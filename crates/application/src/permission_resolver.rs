use std::sync::Arc;

use fieldcrew_core::{AppError, AppResult, TenantId};
use fieldcrew_domain::{
    Capability, CustomRoleId, PermissionSet, Role, RoleCatalog, RoleLevel, RoleReference,
    can_manage_role,
};
use tracing::warn;

use crate::{CustomRoleRepository, RoleAssignmentRepository};

/// How a subject's effective permission set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSource {
    /// Permissions of the assigned role.
    Assigned,
    /// The assigned custom role is missing or inactive; lowest privilege applies.
    LowestPrivilegeFallback,
    /// The subject has no assignment in the tenant.
    Unassigned,
}

/// Effective permission set for one subject in one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissions {
    /// Role used for hierarchy decisions, absent for unassigned subjects.
    pub role: Option<Role>,
    /// Resolved permission set.
    pub permissions: PermissionSet,
    /// Resolution path.
    pub source: PermissionSource,
}

impl EffectivePermissions {
    /// Returns the empty resolution used for non-members.
    #[must_use]
    pub fn unassigned() -> Self {
        Self {
            role: None,
            permissions: PermissionSet::empty(),
            source: PermissionSource::Unassigned,
        }
    }

    /// Returns the hierarchy level; unassigned subjects sit at the bottom.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        self.role.as_ref().map(Role::level).unwrap_or_default()
    }

    /// Returns whether the capability is granted.
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.permissions.allows(capability)
    }

    /// Returns whether these permissions may manage the target role.
    #[must_use]
    pub fn can_manage(&self, target: &Role) -> bool {
        self.role.is_some() && can_manage_role(self.level(), &self.permissions, target.level())
    }
}

/// Resolves a subject's permissions from their single role assignment.
///
/// Every lookup goes through the tenant-scoped repositories; results are not
/// cached, so role edits apply on the next check.
#[derive(Clone)]
pub struct PermissionResolver {
    catalog: Arc<RoleCatalog>,
    custom_roles: Arc<dyn CustomRoleRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
}

impl PermissionResolver {
    /// Creates a resolver over a loaded catalog and the role repositories.
    #[must_use]
    pub fn new(
        catalog: Arc<RoleCatalog>,
        custom_roles: Arc<dyn CustomRoleRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
    ) -> Self {
        Self {
            catalog,
            custom_roles,
            assignments,
        }
    }

    /// Returns the built-in role catalog.
    #[must_use]
    pub fn catalog(&self) -> &RoleCatalog {
        self.catalog.as_ref()
    }

    /// Returns the effective permissions of a subject.
    ///
    /// A subject without an assignment resolves to the empty set. A built-in
    /// role name the catalog does not know fails with `UnknownRole`.
    pub async fn effective_permissions(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<EffectivePermissions> {
        let Some(assignment) = self
            .assignments
            .find_assignment(tenant_id, subject)
            .await?
        else {
            return Ok(EffectivePermissions::unassigned());
        };

        match assignment.role {
            RoleReference::BuiltIn(role) => Ok(EffectivePermissions {
                permissions: self.catalog.permissions(role)?.clone(),
                role: Some(self.catalog.role(role)?),
                source: PermissionSource::Assigned,
            }),
            RoleReference::Custom(role_id) => {
                match self.custom_roles.find_role(tenant_id, role_id).await? {
                    Some(role) if role.is_active() => Ok(EffectivePermissions {
                        permissions: role.permissions().clone(),
                        role: Some(Role::Custom(role)),
                        source: PermissionSource::Assigned,
                    }),
                    stale => {
                        warn!(
                            tenant_id = %tenant_id,
                            subject,
                            role_id = %role_id,
                            found = stale.is_some(),
                            "custom role unavailable, resolving lowest privilege"
                        );
                        self.lowest_privilege()
                    }
                }
            }
        }
    }

    /// Returns whether the subject holds a capability.
    pub async fn has_capability(
        &self,
        tenant_id: TenantId,
        subject: &str,
        capability: Capability,
    ) -> AppResult<bool> {
        Ok(self
            .effective_permissions(tenant_id, subject)
            .await?
            .allows(capability))
    }

    /// Returns whether the subject holds a capability given by transport name.
    ///
    /// Unknown capability names fail with `Validation`.
    pub async fn has_capability_named(
        &self,
        tenant_id: TenantId,
        subject: &str,
        capability: &str,
    ) -> AppResult<bool> {
        let capability = Capability::from_transport(capability)?;
        self.has_capability(tenant_id, subject, capability).await
    }

    /// Loads a role that may be assigned right now.
    ///
    /// Custom roles must exist in the tenant and be active.
    pub async fn assignable_role(
        &self,
        tenant_id: TenantId,
        reference: RoleReference,
    ) -> AppResult<Role> {
        let role = self.stored_role(tenant_id, reference).await?;
        if let Role::Custom(custom) = &role {
            custom.ensure_active()?;
        }

        Ok(role)
    }

    /// Loads a role as stored, including deactivated custom roles.
    pub async fn stored_role(
        &self,
        tenant_id: TenantId,
        reference: RoleReference,
    ) -> AppResult<Role> {
        match reference {
            RoleReference::BuiltIn(role) => self.catalog.role(role),
            RoleReference::Custom(role_id) => Ok(Role::Custom(
                self.find_custom_role(tenant_id, role_id).await?,
            )),
        }
    }

    async fn find_custom_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<fieldcrew_domain::CustomRole> {
        self.custom_roles
            .find_role(tenant_id, role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
                ))
            })
    }

    fn lowest_privilege(&self) -> AppResult<EffectivePermissions> {
        let lowest = self.catalog.lowest_privilege();
        Ok(EffectivePermissions {
            permissions: self.catalog.permissions(lowest)?.clone(),
            role: Some(self.catalog.role(lowest)?),
            source: PermissionSource::LowestPrivilegeFallback,
        })
    }
}
