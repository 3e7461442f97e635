use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use fieldcrew_application::{
    AssignmentChange, CustomRoleRepository, InvitationRepository, RoleAssignment,
    RoleAssignmentRepository, RoleDeactivation,
};
use fieldcrew_core::{AppError, AppResult, NonEmptyString, TenantId};
use fieldcrew_domain::{
    CustomRole, CustomRoleId, EmailAddress, Invitation, InvitationId, InvitationParts,
    PermissionSet, RoleLevel, RoleReference,
};

mod assignments;
mod invitations;
mod roles;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for custom roles, role assignments and
/// invitations.
///
/// The three share one adapter because deactivation with reassignment and
/// invitation acceptance each span tables in a single transaction.
#[derive(Clone)]
pub struct PostgresAccessControlRepository {
    pool: PgPool,
}

impl PostgresAccessControlRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

#[derive(Debug, FromRow)]
struct CustomRoleRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    level: i16,
    permissions: Json<PermissionSet>,
    is_active: bool,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomRoleRow> for CustomRole {
    type Error = AppError;

    fn try_from(row: CustomRoleRow) -> Result<Self, Self::Error> {
        let level = u8::try_from(row.level).map_err(|_| {
            AppError::Internal(format!("custom role '{}' has invalid level {}", row.id, row.level))
        })?;
        let version = u32::try_from(row.version).map_err(|_| {
            AppError::Internal(format!(
                "custom role '{}' has invalid version {}",
                row.id, row.version
            ))
        })?;

        Ok(CustomRole::restore(
            CustomRoleId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            NonEmptyString::new(row.name)?,
            RoleLevel::new(level),
            row.permissions.0,
            row.is_active,
            version,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    tenant_id: uuid::Uuid,
    subject: String,
    role: String,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<RoleAssignmentRow> for RoleAssignment {
    type Error = AppError;

    fn try_from(row: RoleAssignmentRow) -> Result<Self, Self::Error> {
        Ok(RoleAssignment {
            tenant_id: TenantId::from_uuid(row.tenant_id),
            role: RoleReference::parse(row.role.as_str())?,
            subject: row.subject,
            assigned_at: row.assigned_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    email: String,
    role: String,
    token_hash: String,
    invited_by: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = AppError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        Ok(Invitation::from_parts(InvitationParts {
            id: InvitationId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            email: EmailAddress::new(row.email)?,
            role: RoleReference::parse(row.role.as_str())?,
            token_hash: row.token_hash,
            invited_by: row.invited_by,
            status: row.status.parse()?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            accepted_by: row.accepted_by,
            resolved_at: row.resolved_at,
        }))
    }
}

/// Locks an assignable custom role row and fails unless it is active.
///
/// The shared lock keeps a concurrent deactivation from committing between
/// the check and the caller's write.
async fn lock_active_custom_role(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    role: RoleReference,
) -> AppResult<()> {
    let Some(role_id) = role.custom_role_id() else {
        return Ok(());
    };

    let is_active = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT is_active
        FROM custom_roles
        WHERE tenant_id = $1 AND id = $2
        FOR SHARE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(role_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock custom role: {error}")))?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
        ))
    })?;

    if !is_active {
        return Err(AppError::Conflict(format!(
            "custom role '{role_id}' is deactivated"
        )));
    }

    Ok(())
}

#[async_trait]
impl CustomRoleRepository for PostgresAccessControlRepository {
    async fn create_role(&self, role: CustomRole) -> AppResult<CustomRole> {
        self.create_role_impl(role).await
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        self.find_role_impl(tenant_id, role_id).await
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        self.list_roles_impl(tenant_id).await
    }

    async fn replace_permissions(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        permissions: PermissionSet,
        expected_version: Option<u32>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<CustomRole> {
        self.replace_permissions_impl(tenant_id, role_id, permissions, expected_version, updated_at)
            .await
    }

    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        reassign_to: Option<RoleReference>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<RoleDeactivation> {
        self.deactivate_role_impl(tenant_id, role_id, reassign_to, updated_at)
            .await
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresAccessControlRepository {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        self.find_assignment_impl(tenant_id, subject).await
    }

    async fn list_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        self.list_assignments_impl(tenant_id).await
    }

    async fn count_holders(&self, tenant_id: TenantId, role: RoleReference) -> AppResult<u64> {
        self.count_holders_impl(tenant_id, role).await
    }

    async fn replace_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        expected: RoleReference,
        role: RoleReference,
    ) -> AppResult<AssignmentChange> {
        self.replace_assignment_impl(tenant_id, subject, expected, role)
            .await
    }

    async fn assign_if_tenant_empty(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role: RoleReference,
    ) -> AppResult<bool> {
        self.assign_if_tenant_empty_impl(tenant_id, subject, role)
            .await
    }
}

#[async_trait]
impl InvitationRepository for PostgresAccessControlRepository {
    async fn create_invitation(&self, invitation: Invitation) -> AppResult<()> {
        self.create_invitation_impl(invitation).await
    }

    async fn list_invitations(&self, tenant_id: TenantId) -> AppResult<Vec<Invitation>> {
        self.list_invitations_impl(tenant_id).await
    }

    async fn revoke_invitation(
        &self,
        tenant_id: TenantId,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        self.revoke_invitation_impl(tenant_id, invitation_id, now)
            .await
    }

    async fn accept_invitation(
        &self,
        tenant_id: TenantId,
        token_hash: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        self.accept_invitation_impl(tenant_id, token_hash, subject, now)
            .await
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.expire_overdue_impl(now).await
    }
}
