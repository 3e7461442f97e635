use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldcrew_application::{
    AssignmentChange, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, CustomRoleRepository, InvitationRepository, RoleAssignment,
    RoleAssignmentRepository, RoleDeactivation,
};
use fieldcrew_core::{AppError, AppResult, TenantId};
use fieldcrew_domain::{
    CustomRole, CustomRoleId, Invitation, InvitationId, PermissionSet, RoleReference,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct AccessState {
    roles: HashMap<(TenantId, CustomRoleId), CustomRole>,
    assignments: HashMap<(TenantId, String), RoleAssignment>,
    invitations: HashMap<(TenantId, InvitationId), Invitation>,
    audit_entries: Vec<(TenantId, AuditLogEntry)>,
}

impl AccessState {
    fn find_role(&self, tenant_id: TenantId, role_id: CustomRoleId) -> AppResult<&CustomRole> {
        self.roles.get(&(tenant_id, role_id)).ok_or_else(|| {
            AppError::NotFound(format!(
                "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
            ))
        })
    }

    fn ensure_assignable(&self, tenant_id: TenantId, role: RoleReference) -> AppResult<()> {
        match role.custom_role_id() {
            Some(role_id) => self.find_role(tenant_id, role_id)?.ensure_active(),
            None => Ok(()),
        }
    }

    fn holders(&self, tenant_id: TenantId, role: RoleReference) -> Vec<String> {
        let mut holders = self
            .assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id && assignment.role == role)
            .map(|assignment| assignment.subject.clone())
            .collect::<Vec<_>>();
        holders.sort();
        holders
    }
}

/// In-memory adapter for every access-control port.
///
/// A single lock guards all tables, so the multi-table operations are atomic
/// the same way the PostgreSQL transactions are.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    state: RwLock<AccessState>,
}

impl InMemoryAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomRoleRepository for InMemoryAccessStore {
    async fn create_role(&self, role: CustomRole) -> AppResult<CustomRole> {
        let mut state = self.state.write().await;
        let name_key = role.name_key();
        if state
            .roles
            .values()
            .any(|existing| existing.tenant_id() == role.tenant_id() && existing.name_key() == name_key)
        {
            return Err(AppError::DuplicateName(format!(
                "custom role '{}' already exists",
                role.name()
            )));
        }

        state
            .roles
            .insert((role.tenant_id(), role.id()), role.clone());
        Ok(role)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&(tenant_id, role_id))
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let state = self.state.read().await;
        let mut roles = state
            .roles
            .iter()
            .filter_map(|((stored_tenant_id, _), role)| {
                (stored_tenant_id == &tenant_id).then_some(role.clone())
            })
            .collect::<Vec<_>>();
        roles.sort_by_key(CustomRole::name_key);
        Ok(roles)
    }

    async fn replace_permissions(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        permissions: PermissionSet,
        expected_version: Option<u32>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<CustomRole> {
        let mut state = self.state.write().await;
        let role = state.roles.get_mut(&(tenant_id, role_id)).ok_or_else(|| {
            AppError::NotFound(format!(
                "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
            ))
        })?;

        if let Some(expected) = expected_version
            && expected != role.version()
        {
            return Err(AppError::Conflict(format!(
                "custom role '{role_id}' is at version {}, not {expected}",
                role.version()
            )));
        }

        role.replace_permissions(permissions, updated_at)?;
        Ok(role.clone())
    }

    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        reassign_to: Option<RoleReference>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<RoleDeactivation> {
        let mut state = self.state.write().await;
        let mut role = state.find_role(tenant_id, role_id)?.clone();
        role.deactivate(updated_at)?;

        let holders = state.holders(tenant_id, RoleReference::Custom(role_id));
        let reassigned_subjects = match reassign_to {
            None if !holders.is_empty() => {
                return Err(AppError::DanglingAssignment {
                    role_id: role_id.to_string(),
                    holders: holders.len() as u64,
                });
            }
            None => Vec::new(),
            Some(target) => {
                state.ensure_assignable(tenant_id, target)?;
                for subject in &holders {
                    if let Some(assignment) = state.assignments.get_mut(&(tenant_id, subject.clone())) {
                        assignment.role = target;
                        assignment.assigned_at = updated_at;
                    }
                }
                holders
            }
        };

        state.roles.insert((tenant_id, role_id), role.clone());
        Ok(RoleDeactivation {
            role,
            reassigned_subjects,
        })
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryAccessStore {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .get(&(tenant_id, subject.to_owned()))
            .cloned())
    }

    async fn list_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.read().await;
        let mut assignments = state
            .assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .cloned()
            .collect::<Vec<_>>();
        assignments.sort_by(|left, right| left.subject.cmp(&right.subject));
        Ok(assignments)
    }

    async fn count_holders(&self, tenant_id: TenantId, role: RoleReference) -> AppResult<u64> {
        Ok(self.state.read().await.holders(tenant_id, role).len() as u64)
    }

    async fn replace_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        expected: RoleReference,
        role: RoleReference,
    ) -> AppResult<AssignmentChange> {
        let mut state = self.state.write().await;
        state.ensure_assignable(tenant_id, role)?;

        let assignment = state
            .assignments
            .get_mut(&(tenant_id, subject.to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "subject '{subject}' is not a member of tenant '{tenant_id}'"
                ))
            })?;

        let previous = assignment.role;
        if previous != expected {
            return Err(AppError::Conflict(format!(
                "subject '{subject}' now holds '{previous}', not '{expected}'"
            )));
        }

        assignment.role = role;
        assignment.assigned_at = Utc::now();

        Ok(AssignmentChange {
            previous,
            current: assignment.clone(),
        })
    }

    async fn assign_if_tenant_empty(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role: RoleReference,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state
            .assignments
            .keys()
            .any(|(stored_tenant_id, _)| stored_tenant_id == &tenant_id)
        {
            return Ok(false);
        }

        state.assignments.insert(
            (tenant_id, subject.to_owned()),
            RoleAssignment {
                tenant_id,
                subject: subject.to_owned(),
                role,
                assigned_at: Utc::now(),
            },
        );
        Ok(true)
    }
}

#[async_trait]
impl InvitationRepository for InMemoryAccessStore {
    async fn create_invitation(&self, invitation: Invitation) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .invitations
            .values()
            .any(|existing| existing.token_hash() == invitation.token_hash())
        {
            return Err(AppError::Conflict(
                "invitation token hash already exists".to_owned(),
            ));
        }

        state
            .invitations
            .insert((invitation.tenant_id(), invitation.id()), invitation);
        Ok(())
    }

    async fn list_invitations(&self, tenant_id: TenantId) -> AppResult<Vec<Invitation>> {
        let state = self.state.read().await;
        let mut invitations = state
            .invitations
            .iter()
            .filter_map(|((stored_tenant_id, _), invitation)| {
                (stored_tenant_id == &tenant_id).then_some(invitation.clone())
            })
            .collect::<Vec<_>>();
        invitations.sort_by(|left, right| right.parts().created_at.cmp(&left.parts().created_at));
        Ok(invitations)
    }

    async fn revoke_invitation(
        &self,
        tenant_id: TenantId,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let mut state = self.state.write().await;
        let invitation = state
            .invitations
            .get_mut(&(tenant_id, invitation_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "invitation '{invitation_id}' does not exist in tenant '{tenant_id}'"
                ))
            })?;

        invitation.revoke(now)?;
        Ok(invitation.clone())
    }

    async fn accept_invitation(
        &self,
        tenant_id: TenantId,
        token_hash: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let mut state = self.state.write().await;
        let mut invitation = state
            .invitations
            .iter()
            .find_map(|((stored_tenant_id, _), invitation)| {
                (stored_tenant_id == &tenant_id && invitation.token_hash() == token_hash)
                    .then(|| invitation.clone())
            })
            .ok_or_else(|| {
                AppError::Unauthenticated("invitation token is not recognized".to_owned())
            })?;

        invitation.ensure_acceptable(now)?;
        if state
            .assignments
            .contains_key(&(tenant_id, subject.to_owned()))
        {
            return Err(AppError::Conflict(format!(
                "subject '{subject}' is already a member of tenant '{tenant_id}'"
            )));
        }
        state
            .ensure_assignable(tenant_id, invitation.role())
            .map_err(|error| match error {
                AppError::NotFound(message) => AppError::Conflict(message),
                other => other,
            })?;

        invitation.accept(subject, now)?;
        state.assignments.insert(
            (tenant_id, subject.to_owned()),
            RoleAssignment {
                tenant_id,
                subject: subject.to_owned(),
                role: invitation.role(),
                assigned_at: now,
            },
        );
        state
            .invitations
            .insert((tenant_id, invitation.id()), invitation.clone());

        Ok(invitation)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let expired = state
            .invitations
            .values_mut()
            .map(|invitation| invitation.expire_if_overdue(now))
            .filter(|changed| *changed)
            .count();
        Ok(expired as u64)
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.audit_entries.push((
            event.tenant_id,
            AuditLogEntry {
                event_id: Uuid::new_v4().to_string(),
                actor: event.actor,
                action: event.action,
                target_type: event.target_type,
                target_id: event.target_id,
                before: event.before,
                after: event.after,
                occurred_at: event.occurred_at,
            },
        ));
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAccessStore {
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit_entries
            .iter()
            .rev()
            .filter_map(|(stored_tenant_id, entry)| (stored_tenant_id == &tenant_id).then_some(entry))
            .filter(|entry| query.action.is_none_or(|action| action == entry.action))
            .filter(|entry| {
                query
                    .actor
                    .as_deref()
                    .is_none_or(|actor| actor == entry.actor)
            })
            .skip(query.offset)
            .take(query.limit.max(1))
            .cloned()
            .collect())
    }
}
