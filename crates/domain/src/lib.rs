//! Domain entities and invariants for tenant access control.

#![forbid(unsafe_code)]

mod audit;
mod capability;
mod custom_role;
mod email;
mod invitation;
mod permission_set;
mod role;
mod role_catalog;

pub use audit::AuditAction;
pub use capability::Capability;
pub use custom_role::{CUSTOM_ROLE_NAME_MAX_LENGTH, CustomRole, name_key};
pub use email::EmailAddress;
pub use invitation::{Invitation, InvitationId, InvitationParts, InvitationStatus};
pub use permission_set::PermissionSet;
pub use role::{BuiltInRole, CustomRoleId, Role, RoleLevel, RoleReference};
pub use role_catalog::{
    CUSTOM_ROLE_COLOR, CUSTOM_ROLE_ICON, CatalogEntry, RoleCatalog, RoleCatalogDocument,
    RoleCatalogDocumentEntry, SUPPORTED_CATALOG_VERSION, can_manage_role,
};
