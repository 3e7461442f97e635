use std::sync::Arc;

use fieldcrew_core::{AppError, AppResult, TenantId};
use fieldcrew_domain::{AuditAction, BuiltInRole, Capability, RoleReference};
use tracing::info;

use crate::{
    AuditTarget, AuditTrail, AuthorizedContext, PermissionResolver, RoleAssignment,
    RoleAssignmentRepository, snapshots,
};

const AUDIT_TARGET: &str = "role_assignment";

/// Actor recorded for bootstrap assignments, which have no caller context.
pub const BOOTSTRAP_ACTOR: &str = "system:bootstrap";

/// Application service for tenant membership and role assignment.
#[derive(Clone)]
pub struct TeamService {
    resolver: PermissionResolver,
    repository: Arc<dyn RoleAssignmentRepository>,
    audit_trail: AuditTrail,
}

impl TeamService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        resolver: PermissionResolver,
        repository: Arc<dyn RoleAssignmentRepository>,
        audit_trail: AuditTrail,
    ) -> Self {
        Self {
            resolver,
            repository,
            audit_trail,
        }
    }

    /// Lists tenant role assignments.
    pub async fn list_assignments(
        &self,
        context: &AuthorizedContext,
    ) -> AppResult<Vec<RoleAssignment>> {
        context.ensure(Capability::CanManageUsers)?;
        self.repository.list_assignments(context.tenant_id()).await
    }

    /// Moves a tenant member to another role.
    ///
    /// The caller must be able to manage both the current and the new role,
    /// and cannot change their own assignment.
    pub async fn assign_role(
        &self,
        context: &AuthorizedContext,
        subject: &str,
        role: RoleReference,
    ) -> AppResult<RoleAssignment> {
        context.ensure(Capability::CanManageUsers)?;

        if subject == context.subject() {
            return Err(AppError::Forbidden(
                "subjects cannot change their own role".to_owned(),
            ));
        }

        let current = self
            .repository
            .find_assignment(context.tenant_id(), subject)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "subject '{subject}' is not a member of tenant '{}'",
                    context.tenant_id()
                ))
            })?;

        let current_role = self
            .resolver
            .stored_role(context.tenant_id(), current.role)
            .await?;
        context.ensure_can_manage(&current_role)?;

        let next_role = self
            .resolver
            .assignable_role(context.tenant_id(), role)
            .await?;
        context.ensure_can_manage(&next_role)?;

        let change = self
            .repository
            .replace_assignment(context.tenant_id(), subject, current.role, role)
            .await?;

        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::RoleAssigned,
                AuditTarget::new(AUDIT_TARGET, subject),
                Some(snapshots::assignment(subject, change.previous)),
                Some(snapshots::assignment(subject, role)),
            )
            .await;

        Ok(change.current)
    }

    /// Makes the subject the tenant owner when the tenant has no members yet.
    ///
    /// Returns whether the subject became owner.
    pub async fn bootstrap_owner(&self, tenant_id: TenantId, subject: &str) -> AppResult<bool> {
        let owner = RoleReference::BuiltIn(BuiltInRole::Owner);
        let assigned = self
            .repository
            .assign_if_tenant_empty(tenant_id, subject, owner)
            .await?;

        if assigned {
            info!(tenant_id = %tenant_id, subject, "bootstrapped tenant owner");
            self.audit_trail
                .record(
                    tenant_id,
                    BOOTSTRAP_ACTOR,
                    AuditAction::RoleAssigned,
                    AuditTarget::new(AUDIT_TARGET, subject),
                    None,
                    Some(snapshots::assignment(subject, owner)),
                )
                .await;
        }

        Ok(assigned)
    }
}

#[cfg(test)]
mod tests;
