use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fieldcrew_core::{AppError, AppResult, TenantId, UserIdentity};
use fieldcrew_domain::{
    BuiltInRole, CustomRole, CustomRoleId, Invitation, InvitationId, PermissionSet, RoleCatalog,
    RoleReference,
};
use tokio::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::{
    AccessGuard, AssignmentChange, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, AuditTrail, AuthorizedContext, CustomRoleRepository, CustomRoleService,
    InvitationRepository, InvitationService, PermissionResolver, RoleAssignment,
    RoleAssignmentRepository, RoleDeactivation, TeamService,
};

#[derive(Default)]
struct FakeState {
    roles: HashMap<CustomRoleId, CustomRole>,
    assignments: HashMap<(TenantId, String), RoleAssignment>,
    unparseable_assignments: HashSet<(TenantId, String)>,
    invitations: HashMap<InvitationId, Invitation>,
    changes_after_read: HashMap<(TenantId, String), RoleReference>,
}

#[derive(Default)]
pub(crate) struct FakeAccessStore {
    state: Mutex<FakeState>,
}

impl FakeAccessStore {
    pub(crate) async fn seed_assignment(&self, tenant_id: TenantId, subject: &str, role: RoleReference) {
        self.state.lock().await.assignments.insert(
            (tenant_id, subject.to_owned()),
            RoleAssignment {
                tenant_id,
                subject: subject.to_owned(),
                role,
                assigned_at: Utc::now(),
            },
        );
    }

    /// Moves `subject` to `role` right after the next assignment read, as a
    /// concurrent writer would.
    pub(crate) async fn change_after_next_read(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role: RoleReference,
    ) {
        self.state
            .lock()
            .await
            .changes_after_read
            .insert((tenant_id, subject.to_owned()), role);
    }

    pub(crate) async fn seed_unparseable_assignment(&self, tenant_id: TenantId, subject: &str) {
        self.state
            .lock()
            .await
            .unparseable_assignments
            .insert((tenant_id, subject.to_owned()));
    }

    pub(crate) async fn seed_role(&self, role: CustomRole) {
        self.state.lock().await.roles.insert(role.id(), role);
    }

    pub(crate) async fn seed_invitation(&self, invitation: Invitation) {
        self.state
            .lock()
            .await
            .invitations
            .insert(invitation.id(), invitation);
    }

    pub(crate) async fn assignment(&self, tenant_id: TenantId, subject: &str) -> Option<RoleReference> {
        self.state
            .lock()
            .await
            .assignments
            .get(&(tenant_id, subject.to_owned()))
            .map(|assignment| assignment.role)
    }

    pub(crate) async fn invitation(&self, invitation_id: InvitationId) -> Option<Invitation> {
        self.state
            .lock()
            .await
            .invitations
            .get(&invitation_id)
            .cloned()
    }
}

#[async_trait]
impl CustomRoleRepository for FakeAccessStore {
    async fn create_role(&self, role: CustomRole) -> AppResult<CustomRole> {
        let mut state = self.state.lock().await;
        if state
            .roles
            .values()
            .any(|existing| existing.tenant_id() == role.tenant_id() && existing.name_key() == role.name_key())
        {
            return Err(AppError::DuplicateName(role.name().to_owned()));
        }

        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .get(&role_id)
            .filter(|role| role.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        let mut roles = self
            .state
            .lock()
            .await
            .roles
            .values()
            .filter(|role| role.tenant_id() == tenant_id)
            .cloned()
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
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .get_mut(&role_id)
            .filter(|role| role.tenant_id() == tenant_id)
            .ok_or_else(|| AppError::NotFound(role_id.to_string()))?;

        if expected_version.is_some_and(|version| version != role.version()) {
            return Err(AppError::Conflict("stale version".to_owned()));
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
        let mut state = self.state.lock().await;
        let holders = state
            .assignments
            .values()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id && assignment.role == RoleReference::Custom(role_id)
            })
            .map(|assignment| assignment.subject.clone())
            .collect::<Vec<_>>();

        let mut role = state
            .roles
            .get(&role_id)
            .filter(|role| role.tenant_id() == tenant_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(role_id.to_string()))?;

        let reassigned_subjects = match reassign_to {
            None if !holders.is_empty() => {
                return Err(AppError::DanglingAssignment {
                    role_id: role_id.to_string(),
                    holders: holders.len() as u64,
                });
            }
            None => Vec::new(),
            Some(target) => {
                for subject in &holders {
                    if let Some(assignment) = state.assignments.get_mut(&(tenant_id, subject.clone())) {
                        assignment.role = target;
                        assignment.assigned_at = updated_at;
                    }
                }
                holders
            }
        };

        role.deactivate(updated_at)?;
        state.roles.insert(role_id, role.clone());
        Ok(RoleDeactivation {
            role,
            reassigned_subjects,
        })
    }
}

#[async_trait]
impl RoleAssignmentRepository for FakeAccessStore {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        let mut state = self.state.lock().await;
        let key = (tenant_id, subject.to_owned());
        if state.unparseable_assignments.contains(&key) {
            return Err(AppError::UnknownRole("superuser".to_owned()));
        }

        let found = state.assignments.get(&key).cloned();
        if let Some(role) = state.changes_after_read.remove(&key)
            && let Some(assignment) = state.assignments.get_mut(&key)
        {
            assignment.role = role;
        }

        Ok(found)
    }

    async fn list_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let mut assignments = self
            .state
            .lock()
            .await
            .assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .cloned()
            .collect::<Vec<_>>();
        assignments.sort_by(|left, right| left.subject.cmp(&right.subject));
        Ok(assignments)
    }

    async fn count_holders(&self, tenant_id: TenantId, role: RoleReference) -> AppResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id && assignment.role == role)
            .count() as u64)
    }

    async fn replace_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        expected: RoleReference,
        role: RoleReference,
    ) -> AppResult<AssignmentChange> {
        let mut state = self.state.lock().await;
        let assignment = state
            .assignments
            .get_mut(&(tenant_id, subject.to_owned()))
            .ok_or_else(|| AppError::NotFound(subject.to_owned()))?;

        let previous = assignment.role;
        if previous != expected {
            return Err(AppError::Conflict(format!("{subject} now holds {previous}")));
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
        let mut state = self.state.lock().await;
        if state
            .assignments
            .keys()
            .any(|(assigned_tenant, _)| *assigned_tenant == tenant_id)
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
impl InvitationRepository for FakeAccessStore {
    async fn create_invitation(&self, invitation: Invitation) -> AppResult<()> {
        self.seed_invitation(invitation).await;
        Ok(())
    }

    async fn list_invitations(&self, tenant_id: TenantId) -> AppResult<Vec<Invitation>> {
        Ok(self
            .state
            .lock()
            .await
            .invitations
            .values()
            .filter(|invitation| invitation.tenant_id() == tenant_id)
            .cloned()
            .collect())
    }

    async fn revoke_invitation(
        &self,
        tenant_id: TenantId,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let mut state = self.state.lock().await;
        let invitation = state
            .invitations
            .get_mut(&invitation_id)
            .filter(|invitation| invitation.tenant_id() == tenant_id)
            .ok_or_else(|| AppError::NotFound(invitation_id.to_string()))?;
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
        let mut state = self.state.lock().await;
        let mut invitation = state
            .invitations
            .values()
            .find(|invitation| {
                invitation.tenant_id() == tenant_id && invitation.token_hash() == token_hash
            })
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("unknown token".to_owned()))?;

        invitation.ensure_acceptable(now)?;
        if state.assignments.contains_key(&(tenant_id, subject.to_owned())) {
            return Err(AppError::Conflict("already a member".to_owned()));
        }

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
        state.invitations.insert(invitation.id(), invitation.clone());
        Ok(invitation)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        Ok(state
            .invitations
            .values_mut()
            .map(|invitation| invitation.expire_if_overdue(now))
            .filter(|expired| *expired)
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    pub(crate) fail_writes: bool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.fail_writes {
            return Err(AppError::Internal("audit store offline".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditRepository {
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .events
            .lock()
            .await
            .iter()
            .rev()
            .filter(|event| event.tenant_id == tenant_id)
            .filter(|event| query.action.is_none_or(|action| action == event.action))
            .filter(|event| query.actor.as_deref().is_none_or(|actor| actor == event.actor))
            .skip(query.offset)
            .take(query.limit)
            .enumerate()
            .map(|(index, event)| AuditLogEntry {
                event_id: format!("event-{index}"),
                actor: event.actor.clone(),
                action: event.action,
                target_type: event.target_type.clone(),
                target_id: event.target_id.clone(),
                before: event.before.clone(),
                after: event.after.clone(),
                occurred_at: event.occurred_at,
            })
            .collect())
    }
}

/// Wired services over one fake store.
pub(crate) struct Harness {
    pub(crate) tenant_id: TenantId,
    pub(crate) store: Arc<FakeAccessStore>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) guard: AccessGuard,
    pub(crate) roles: CustomRoleService,
    pub(crate) team: TeamService,
    pub(crate) invitations: InvitationService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_audit(FakeAuditRepository::default())
    }

    pub(crate) fn with_audit(audit: FakeAuditRepository) -> Self {
        let store = Arc::new(FakeAccessStore::default());
        let audit = Arc::new(audit);
        let resolver = PermissionResolver::new(
            Arc::new(RoleCatalog::standard()),
            store.clone(),
            store.clone(),
        );
        let audit_trail = AuditTrail::new(audit.clone(), audit.clone());

        Self {
            tenant_id: TenantId::new(),
            guard: AccessGuard::new(resolver.clone()),
            roles: CustomRoleService::new(
                resolver.clone(),
                store.clone(),
                store.clone(),
                audit_trail.clone(),
            ),
            team: TeamService::new(resolver.clone(), store.clone(), audit_trail.clone()),
            invitations: InvitationService::new(
                resolver,
                store.clone(),
                audit_trail,
                Duration::hours(1),
            ),
            store,
            audit,
        }
    }

    pub(crate) fn identity(&self, subject: &str) -> UserIdentity {
        UserIdentity::new(subject, subject, None, self.tenant_id)
    }

    /// Seeds `subject` with a built-in role and returns their context.
    pub(crate) async fn member(&self, subject: &str, role: BuiltInRole) -> AuthorizedContext {
        self.store
            .seed_assignment(self.tenant_id, subject, RoleReference::BuiltIn(role))
            .await;
        self.context(subject).await
    }

    pub(crate) async fn context(&self, subject: &str) -> AuthorizedContext {
        let identity = self.identity(subject);
        self.guard
            .authenticate(Some(&identity))
            .await
            .unwrap_or_else(|_| panic!("authenticate {subject}"))
    }

    pub(crate) async fn audit_actions(&self) -> Vec<fieldcrew_domain::AuditAction> {
        self.audit
            .events
            .lock()
            .await
            .iter()
            .map(|event| event.action)
            .collect()
    }
}

/// Collects formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    buffer: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Routes this thread's events here until the guard drops.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.extend_from_slice(bytes);
        }
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
