use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldcrew_core::{AppResult, TenantId};
use fieldcrew_domain::{CustomRole, CustomRoleId, PermissionSet, RoleReference};

/// Outcome of a custom role deactivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDeactivation {
    /// Role state after deactivation.
    pub role: CustomRole,
    /// Subjects moved to the reassignment target.
    pub reassigned_subjects: Vec<String>,
}

/// Repository port for tenant custom roles.
///
/// Every method is tenant-scoped; a role id from another tenant behaves as
/// missing.
#[async_trait]
pub trait CustomRoleRepository: Send + Sync {
    /// Inserts a new role. Fails with `DuplicateName` when the case-insensitive
    /// name is taken in the tenant.
    async fn create_role(&self, role: CustomRole) -> AppResult<CustomRole>;

    /// Finds one role, active or not.
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>>;

    /// Lists all roles of the tenant ordered by name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>>;

    /// Replaces the permission set in one conditional write.
    ///
    /// With `expected_version`, a mismatch fails with `Conflict` and leaves the
    /// record untouched. Inactive roles fail with `Conflict`.
    async fn replace_permissions(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        permissions: PermissionSet,
        expected_version: Option<u32>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<CustomRole>;

    /// Deactivates a role in one transaction.
    ///
    /// Without `reassign_to`, fails with `DanglingAssignment` when any subject
    /// holds the role. With it, every holder is moved to the target first.
    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        reassign_to: Option<RoleReference>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<RoleDeactivation>;
}
