use chrono::{DateTime, Utc};
use fieldcrew_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

use crate::{CustomRoleId, PermissionSet, RoleLevel};

/// Maximum custom role name length.
pub const CUSTOM_ROLE_NAME_MAX_LENGTH: usize = 64;

/// Tenant-defined role carrying a full permission set.
///
/// Custom roles are mutated only by full replacement of their permission set
/// and are deactivated rather than deleted, so audit history keeps resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    id: CustomRoleId,
    tenant_id: TenantId,
    name: NonEmptyString,
    level: RoleLevel,
    permissions: PermissionSet,
    is_active: bool,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomRole {
    /// Creates a new active custom role at version 1.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        level: RoleLevel,
        permissions: PermissionSet,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if name.as_str().chars().count() > CUSTOM_ROLE_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "role name must not exceed {CUSTOM_ROLE_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self {
            id: CustomRoleId::new(),
            tenant_id,
            name,
            level,
            permissions,
            is_active: true,
            version: 1,
            created_at,
            updated_at: created_at,
        })
    }

    /// Rebuilds a role from persisted state.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn restore(
        id: CustomRoleId,
        tenant_id: TenantId,
        name: NonEmptyString,
        level: RoleLevel,
        permissions: PermissionSet,
        is_active: bool,
        version: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name,
            level,
            permissions,
            is_active,
            version,
            created_at,
            updated_at,
        }
    }

    /// Returns the role id.
    #[must_use]
    pub fn id(&self) -> CustomRoleId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the role name as entered.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the key used for case-insensitive uniqueness within a tenant.
    #[must_use]
    pub fn name_key(&self) -> String {
        name_key(self.name.as_str())
    }

    /// Returns the hierarchy level.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        self.level
    }

    /// Returns the full permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the role can still be resolved and assigned.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the write version used for compare-and-set updates.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the whole permission set and bumps the version.
    pub fn replace_permissions(
        &mut self,
        permissions: PermissionSet,
        updated_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.ensure_active()?;
        self.permissions = permissions;
        self.version += 1;
        self.updated_at = updated_at;
        Ok(())
    }

    /// Marks the role inactive and bumps the version.
    pub fn deactivate(&mut self, updated_at: DateTime<Utc>) -> AppResult<()> {
        self.ensure_active()?;
        self.is_active = false;
        self.version += 1;
        self.updated_at = updated_at;
        Ok(())
    }

    /// Fails when the role has been deactivated.
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.is_active {
            return Ok(());
        }

        Err(AppError::Conflict(format!(
            "custom role '{}' is deactivated",
            self.id
        )))
    }
}

/// Normalizes a role name for case-insensitive uniqueness checks.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
