use std::fmt::{Display, Formatter};
use std::str::FromStr;

use fieldcrew_core::AppError;
use serde::{Deserialize, Serialize};

/// Fine-grained capability flags checked by the access guard.
///
/// The set is closed: an unrecognized capability name is a parse error, never
/// a silent `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Allows reading projects.
    CanViewProjects,
    /// Allows creating and editing projects.
    CanEditProjects,
    /// Allows deleting projects.
    CanDeleteProjects,
    /// Allows reading quotes.
    CanViewQuotes,
    /// Allows drafting quotes.
    CanCreateQuotes,
    /// Allows approving quotes for sending.
    CanApproveQuotes,
    /// Allows reading revenue, margin and cost figures.
    CanViewFinancials,
    /// Allows uploading field photos.
    CanCapturePhotos,
    /// Allows reading compliance records.
    CanViewCompliance,
    /// Allows editing compliance records.
    CanManageCompliance,
    /// Allows changing team members' role assignments.
    CanManageUsers,
    /// Allows sending and revoking invitations.
    CanInviteUsers,
    /// Allows managing any role regardless of hierarchy level.
    CanManageRoles,
    /// Allows reading the audit log.
    CanViewAuditLog,
    /// Allows editing organization settings.
    CanManageSettings,
}

impl Capability {
    /// Returns a stable storage and transport value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CanViewProjects => "canViewProjects",
            Self::CanEditProjects => "canEditProjects",
            Self::CanDeleteProjects => "canDeleteProjects",
            Self::CanViewQuotes => "canViewQuotes",
            Self::CanCreateQuotes => "canCreateQuotes",
            Self::CanApproveQuotes => "canApproveQuotes",
            Self::CanViewFinancials => "canViewFinancials",
            Self::CanCapturePhotos => "canCapturePhotos",
            Self::CanViewCompliance => "canViewCompliance",
            Self::CanManageCompliance => "canManageCompliance",
            Self::CanManageUsers => "canManageUsers",
            Self::CanInviteUsers => "canInviteUsers",
            Self::CanManageRoles => "canManageRoles",
            Self::CanViewAuditLog => "canViewAuditLog",
            Self::CanManageSettings => "canManageSettings",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::CanViewProjects,
            Capability::CanEditProjects,
            Capability::CanDeleteProjects,
            Capability::CanViewQuotes,
            Capability::CanCreateQuotes,
            Capability::CanApproveQuotes,
            Capability::CanViewFinancials,
            Capability::CanCapturePhotos,
            Capability::CanViewCompliance,
            Capability::CanManageCompliance,
            Capability::CanManageUsers,
            Capability::CanInviteUsers,
            Capability::CanManageRoles,
            Capability::CanViewAuditLog,
            Capability::CanManageSettings,
        ];

        ALL
    }

    /// Parses a transport value into a capability.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl Display for Capability {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown capability '{value}'")))
    }
}
