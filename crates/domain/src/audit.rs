use std::str::FromStr;

use fieldcrew_core::AppError;
use serde::{Deserialize, Serialize};

/// Permission-relevant actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A custom role was created.
    RoleCreated,
    /// A custom role's permission set was replaced.
    RolePermissionsUpdated,
    /// A custom role was deactivated.
    RoleDeactivated,
    /// A user's role assignment changed.
    RoleAssigned,
    /// An invitation was sent.
    InvitationSent,
    /// An invitation was accepted.
    InvitationAccepted,
    /// An invitation was revoked.
    InvitationRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role.created",
            Self::RolePermissionsUpdated => "role.permissions_updated",
            Self::RoleDeactivated => "role.deactivated",
            Self::RoleAssigned => "role.assigned",
            Self::InvitationSent => "invitation.sent",
            Self::InvitationAccepted => "invitation.accepted",
            Self::InvitationRevoked => "invitation.revoked",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role.created" => Ok(Self::RoleCreated),
            "role.permissions_updated" => Ok(Self::RolePermissionsUpdated),
            "role.deactivated" => Ok(Self::RoleDeactivated),
            "role.assigned" => Ok(Self::RoleAssigned),
            "invitation.sent" => Ok(Self::InvitationSent),
            "invitation.accepted" => Ok(Self::InvitationAccepted),
            "invitation.revoked" => Ok(Self::InvitationRevoked),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}
