use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldcrew_core::{AppResult, TenantId};
use fieldcrew_domain::RoleReference;

/// The single active role a subject holds in a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Subject identifier.
    pub subject: String,
    /// Assigned role.
    pub role: RoleReference,
    /// Time of the last change.
    pub assigned_at: DateTime<Utc>,
}

/// Result of replacing a member's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentChange {
    /// Role held before the change.
    pub previous: RoleReference,
    /// Assignment after the change.
    pub current: RoleAssignment,
}

/// Repository port for user-role assignments.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Finds the subject's assignment. A stored role that no longer parses
    /// fails with `UnknownRole`.
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists tenant assignments ordered by subject.
    async fn list_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>>;

    /// Counts subjects holding a role.
    async fn count_holders(&self, tenant_id: TenantId, role: RoleReference) -> AppResult<u64>;

    /// Replaces an existing member's assignment, provided the member still
    /// holds `expected`.
    ///
    /// Fails with `NotFound` when the subject is not a member and with
    /// `Conflict` when the stored role is no longer `expected`.
    async fn replace_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        expected: RoleReference,
        role: RoleReference,
    ) -> AppResult<AssignmentChange>;

    /// Assigns the role only when the tenant has no assignments yet.
    /// Returns whether the assignment was written.
    async fn assign_if_tenant_empty(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role: RoleReference,
    ) -> AppResult<bool>;
}
