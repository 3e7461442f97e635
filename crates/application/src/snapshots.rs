//! Audit snapshots of the fields a reviewer diffs.

use fieldcrew_domain::{CustomRole, Invitation, RoleReference};
use serde_json::{Value, json};

pub(crate) fn custom_role(role: &CustomRole) -> Value {
    json!({
        "name": role.name(),
        "level": role.level().value(),
        "permissions": role.permissions().to_flags(),
        "isActive": role.is_active(),
        "version": role.version(),
    })
}

pub(crate) fn assignment(subject: &str, role: RoleReference) -> Value {
    json!({
        "subject": subject,
        "role": role.to_string(),
    })
}

pub(crate) fn invitation(invitation: &Invitation) -> Value {
    let parts = invitation.parts();
    json!({
        "email": parts.email.as_str(),
        "role": parts.role.to_string(),
        "status": parts.status.as_str(),
        "expiresAt": parts.expires_at.to_rfc3339(),
        "acceptedBy": parts.accepted_by,
    })
}
