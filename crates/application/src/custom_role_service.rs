use std::sync::Arc;

use chrono::Utc;
use fieldcrew_core::{AppError, AppResult};
use fieldcrew_domain::{
    AuditAction, Capability, CustomRole, CustomRoleId, PermissionSet, Role, RoleLevel,
    RoleReference,
};

use crate::{
    AuditTarget, AuditTrail, AuthorizedContext, CustomRoleRepository, PermissionResolver,
    RoleAssignmentRepository, RoleDeactivation, snapshots,
};

const AUDIT_TARGET: &str = "custom_role";

/// Input payload for custom role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomRoleInput {
    /// Display name, unique per tenant ignoring case.
    pub name: String,
    /// Hierarchy level, below the top built-in level.
    pub level: u8,
    /// Full permission set.
    pub permissions: PermissionSet,
}

/// Input payload for replacing a custom role's permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCustomRolePermissionsInput {
    /// Replacement permission set.
    pub permissions: PermissionSet,
    /// Version the caller last read; mismatches fail with `Conflict`.
    pub expected_version: Option<u32>,
}

/// A custom role with the number of members currently holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRoleListing {
    /// The role record.
    pub role: CustomRole,
    /// Members assigned the role. Deactivating without reassignment requires zero.
    pub holders: u64,
}

/// Application service for tenant custom roles.
#[derive(Clone)]
pub struct CustomRoleService {
    resolver: PermissionResolver,
    repository: Arc<dyn CustomRoleRepository>,
    assignments: Arc<dyn RoleAssignmentRepository>,
    audit_trail: AuditTrail,
}

impl CustomRoleService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        resolver: PermissionResolver,
        repository: Arc<dyn CustomRoleRepository>,
        assignments: Arc<dyn RoleAssignmentRepository>,
        audit_trail: AuditTrail,
    ) -> Self {
        Self {
            resolver,
            repository,
            assignments,
            audit_trail,
        }
    }

    /// Lists tenant custom roles with their holder counts, for role pickers
    /// and administration.
    pub async fn list_roles(
        &self,
        context: &AuthorizedContext,
    ) -> AppResult<Vec<CustomRoleListing>> {
        context.ensure_any(&[
            Capability::CanManageRoles,
            Capability::CanManageUsers,
            Capability::CanInviteUsers,
        ])?;

        let roles = self.repository.list_roles(context.tenant_id()).await?;
        let mut listings = Vec::with_capacity(roles.len());
        for role in roles {
            let holders = self
                .assignments
                .count_holders(context.tenant_id(), RoleReference::Custom(role.id()))
                .await?;
            listings.push(CustomRoleListing { role, holders });
        }

        Ok(listings)
    }

    /// Returns one tenant custom role.
    pub async fn find_role(
        &self,
        context: &AuthorizedContext,
        role_id: CustomRoleId,
    ) -> AppResult<CustomRole> {
        context.ensure_any(&[
            Capability::CanManageRoles,
            Capability::CanManageUsers,
            Capability::CanInviteUsers,
        ])?;

        self.load_role(context, role_id).await
    }

    /// Creates a custom role.
    pub async fn create_role(
        &self,
        context: &AuthorizedContext,
        input: CreateCustomRoleInput,
    ) -> AppResult<CustomRole> {
        context.ensure(Capability::CanManageRoles)?;

        let top_level = self.resolver.catalog().top_level();
        let level = RoleLevel::new(input.level);
        if level >= top_level {
            return Err(AppError::Validation(format!(
                "custom role level must be below {top_level}"
            )));
        }

        let role = CustomRole::new(
            context.tenant_id(),
            input.name,
            level,
            input.permissions,
            Utc::now(),
        )?;
        context.ensure_can_manage(&Role::Custom(role.clone()))?;

        let created = self.repository.create_role(role).await?;
        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::RoleCreated,
                AuditTarget::new(AUDIT_TARGET, created.id().to_string()),
                None,
                Some(snapshots::custom_role(&created)),
            )
            .await;

        Ok(created)
    }

    /// Replaces a custom role's full permission set.
    pub async fn update_role_permissions(
        &self,
        context: &AuthorizedContext,
        role_id: CustomRoleId,
        input: UpdateCustomRolePermissionsInput,
    ) -> AppResult<CustomRole> {
        context.ensure(Capability::CanManageRoles)?;

        let existing = self.load_role(context, role_id).await?;
        existing.ensure_active()?;
        context.ensure_can_manage(&Role::Custom(existing.clone()))?;

        let updated = self
            .repository
            .replace_permissions(
                context.tenant_id(),
                role_id,
                input.permissions,
                input.expected_version,
                Utc::now(),
            )
            .await?;

        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::RolePermissionsUpdated,
                AuditTarget::new(AUDIT_TARGET, role_id.to_string()),
                Some(snapshots::custom_role(&existing)),
                Some(snapshots::custom_role(&updated)),
            )
            .await;

        Ok(updated)
    }

    /// Deactivates a custom role, optionally moving its holders first.
    pub async fn deactivate_role(
        &self,
        context: &AuthorizedContext,
        role_id: CustomRoleId,
        reassign_to: Option<RoleReference>,
    ) -> AppResult<RoleDeactivation> {
        context.ensure(Capability::CanManageRoles)?;

        let existing = self.load_role(context, role_id).await?;
        existing.ensure_active()?;
        context.ensure_can_manage(&Role::Custom(existing.clone()))?;

        if let Some(target) = reassign_to {
            if target == RoleReference::Custom(role_id) {
                return Err(AppError::Validation(
                    "a role cannot be reassigned to itself".to_owned(),
                ));
            }

            let target_role = self
                .resolver
                .assignable_role(context.tenant_id(), target)
                .await?;
            context.ensure_can_manage(&target_role)?;
        }

        let deactivation = self
            .repository
            .deactivate_role(context.tenant_id(), role_id, reassign_to, Utc::now())
            .await?;

        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::RoleDeactivated,
                AuditTarget::new(AUDIT_TARGET, role_id.to_string()),
                Some(snapshots::custom_role(&existing)),
                Some(snapshots::custom_role(&deactivation.role)),
            )
            .await;

        if let Some(target) = reassign_to {
            for subject in &deactivation.reassigned_subjects {
                self.audit_trail
                    .record(
                        context.tenant_id(),
                        context.subject(),
                        AuditAction::RoleAssigned,
                        AuditTarget::new("role_assignment", subject.clone()),
                        Some(snapshots::assignment(
                            subject,
                            RoleReference::Custom(role_id),
                        )),
                        Some(snapshots::assignment(subject, target)),
                    )
                    .await;
            }
        }

        Ok(deactivation)
    }

    async fn load_role(
        &self,
        context: &AuthorizedContext,
        role_id: CustomRoleId,
    ) -> AppResult<CustomRole> {
        self.repository
            .find_role(context.tenant_id(), role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "custom role '{role_id}' does not exist in tenant '{}'",
                    context.tenant_id()
                ))
            })
    }
}

#[cfg(test)]
mod tests;
