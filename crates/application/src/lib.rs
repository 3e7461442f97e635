//! Application services and ports for tenant access control.

#![forbid(unsafe_code)]

mod access_guard;
mod access_ports;
mod audit_trail;
mod custom_role_service;
mod invitation_service;
mod permission_resolver;
mod snapshots;
mod team_service;

#[cfg(test)]
mod test_support;

pub use access_guard::{AccessGuard, AuthorizedContext};
pub use access_ports::{
    AssignmentChange, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditRepository, CustomRoleRepository, InvitationRepository, RoleAssignment,
    RoleAssignmentRepository, RoleDeactivation,
};
pub use audit_trail::{AUDIT_LOG_MAX_LIMIT, AuditTarget, AuditTrail};
pub use custom_role_service::{
    CreateCustomRoleInput, CustomRoleListing, CustomRoleService, UpdateCustomRolePermissionsInput,
};
pub use invitation_service::{
    DEFAULT_INVITATION_TTL_HOURS, InvitationService, IssuedInvitation, SendInvitationInput,
};
pub use permission_resolver::{EffectivePermissions, PermissionResolver, PermissionSource};
pub use team_service::{BOOTSTRAP_ACTOR, TeamService};
