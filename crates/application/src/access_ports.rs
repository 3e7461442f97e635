mod assignments;
mod audit;
mod invitations;
mod roles;

pub use assignments::{AssignmentChange, RoleAssignment, RoleAssignmentRepository};
pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository};
pub use invitations::InvitationRepository;
pub use roles::{CustomRoleRepository, RoleDeactivation};
