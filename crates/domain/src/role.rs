use std::fmt::{Display, Formatter};
use std::str::FromStr;

use fieldcrew_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CustomRole;

/// Fixed, non-customizable roles shipped with the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInRole {
    /// Organization owner.
    Owner,
    /// Organization administrator.
    Admin,
    /// Project and crew manager.
    Manager,
    /// Compliance officer; manages roles without sitting at the top of the hierarchy.
    ComplianceOfficer,
    /// Prepares quotes.
    Estimator,
    /// Field technician capturing site work.
    FieldTech,
    /// Read-only member.
    Viewer,
}

impl BuiltInRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::ComplianceOfficer => "compliance_officer",
            Self::Estimator => "estimator",
            Self::FieldTech => "field_tech",
            Self::Viewer => "viewer",
        }
    }

    /// Returns all built-in roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[BuiltInRole] = &[
            BuiltInRole::Owner,
            BuiltInRole::Admin,
            BuiltInRole::Manager,
            BuiltInRole::ComplianceOfficer,
            BuiltInRole::Estimator,
            BuiltInRole::FieldTech,
            BuiltInRole::Viewer,
        ];

        ALL
    }
}

impl Display for BuiltInRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for BuiltInRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::UnknownRole(format!("'{value}' is not a built-in role")))
    }
}

/// Ordered hierarchy rank; higher means more authority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoleLevel(u8);

impl RoleLevel {
    /// Creates a level from its numeric rank.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns the numeric rank.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Display for RoleLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a tenant-defined role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomRoleId(Uuid);

impl CustomRoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a transport value into a role identifier.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

impl Default for CustomRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CustomRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

const CUSTOM_ROLE_PREFIX: &str = "custom:";

/// Role a user is assigned to: either a built-in role or a tenant custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleReference {
    /// Reference to a built-in role.
    BuiltIn(BuiltInRole),
    /// Reference to a custom role owned by the assignment's tenant.
    Custom(CustomRoleId),
}

impl RoleReference {
    /// Parses `field_tech`-style built-in names or `custom:<uuid>` references.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let value = value.trim();
        match value.strip_prefix(CUSTOM_ROLE_PREFIX) {
            Some(role_id) => CustomRoleId::parse(role_id)
                .map(Self::Custom)
                .map_err(|_| AppError::UnknownRole(format!("'{value}' is not a valid role"))),
            None => BuiltInRole::from_str(value).map(Self::BuiltIn),
        }
    }

    /// Returns the custom role id, if this references one.
    #[must_use]
    pub fn custom_role_id(&self) -> Option<CustomRoleId> {
        match self {
            Self::BuiltIn(_) => None,
            Self::Custom(role_id) => Some(*role_id),
        }
    }
}

impl Display for RoleReference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuiltIn(role) => formatter.write_str(role.as_str()),
            Self::Custom(role_id) => write!(formatter, "{CUSTOM_ROLE_PREFIX}{role_id}"),
        }
    }
}

impl From<BuiltInRole> for RoleReference {
    fn from(value: BuiltInRole) -> Self {
        Self::BuiltIn(value)
    }
}

impl Serialize for RoleReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoleReference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(value.as_str()).map_err(serde::de::Error::custom)
    }
}

/// A resolved role with the attributes used for hierarchy decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Built-in role with its catalog level.
    BuiltIn {
        /// Role name.
        role: BuiltInRole,
        /// Hierarchy level from the catalog.
        level: RoleLevel,
    },
    /// Tenant custom role record.
    Custom(CustomRole),
}

impl Role {
    /// Returns the hierarchy level.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        match self {
            Self::BuiltIn { level, .. } => *level,
            Self::Custom(role) => role.level(),
        }
    }

    /// Returns the assignment reference for this role.
    #[must_use]
    pub fn reference(&self) -> RoleReference {
        match self {
            Self::BuiltIn { role, .. } => RoleReference::BuiltIn(*role),
            Self::Custom(role) => RoleReference::Custom(role.id()),
        }
    }
}
