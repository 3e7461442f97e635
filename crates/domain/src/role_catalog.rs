//! Built-in role table.
//!
//! The catalog is built once at process start, either from the compiled default
//! table or from a versioned JSON document, and is read-only afterwards.

use std::collections::BTreeMap;
use std::str::FromStr;

use fieldcrew_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{BuiltInRole, Capability, PermissionSet, Role, RoleLevel};

/// Catalog document version understood by this build.
pub const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// Color used for custom roles in presentation lookups.
pub const CUSTOM_ROLE_COLOR: &str = "#475569";

/// Icon used for custom roles in presentation lookups.
pub const CUSTOM_ROLE_ICON: &str = "user-cog";

/// One built-in role row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Canonical permission set for the role.
    pub permissions: PermissionSet,
    /// Hierarchy level.
    pub level: RoleLevel,
    /// Human-readable name; presentation only.
    pub display_name: String,
    /// Badge color; presentation only.
    pub color: String,
    /// Icon name; presentation only.
    pub icon: String,
}

/// Versioned on-disk representation of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalogDocument {
    /// Document schema version.
    pub version: u32,
    /// One definition per built-in role.
    pub roles: Vec<RoleCatalogDocumentEntry>,
}

/// Built-in role definition inside a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalogDocumentEntry {
    /// Built-in role name, e.g. `field_tech`.
    pub name: String,
    /// Hierarchy level.
    pub level: u8,
    /// Human-readable name.
    pub display_name: String,
    /// Badge color.
    pub color: String,
    /// Icon name.
    pub icon: String,
    /// Granted capability names; everything else is denied.
    pub permissions: Vec<String>,
}

/// Immutable mapping from built-in roles to canonical permission sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    version: u32,
    entries: BTreeMap<BuiltInRole, CatalogEntry>,
    lowest_privilege: BuiltInRole,
}

impl RoleCatalog {
    /// Returns the compiled default catalog.
    #[must_use]
    pub fn standard() -> Self {
        use Capability::*;

        let rows: [(BuiltInRole, u8, &str, &str, &str, &[Capability]); 7] = [
            (
                BuiltInRole::Owner,
                5,
                "Owner",
                "#7c3aed",
                "crown",
                Capability::all(),
            ),
            (
                BuiltInRole::Admin,
                4,
                "Administrator",
                "#dc2626",
                "shield",
                &[
                    CanViewProjects,
                    CanEditProjects,
                    CanDeleteProjects,
                    CanViewQuotes,
                    CanCreateQuotes,
                    CanApproveQuotes,
                    CanViewFinancials,
                    CanCapturePhotos,
                    CanViewCompliance,
                    CanManageCompliance,
                    CanManageUsers,
                    CanInviteUsers,
                    CanManageRoles,
                    CanViewAuditLog,
                ],
            ),
            (
                BuiltInRole::Manager,
                3,
                "Manager",
                "#2563eb",
                "briefcase",
                &[
                    CanViewProjects,
                    CanEditProjects,
                    CanViewQuotes,
                    CanCreateQuotes,
                    CanApproveQuotes,
                    CanViewFinancials,
                    CanCapturePhotos,
                    CanViewCompliance,
                    CanManageUsers,
                    CanInviteUsers,
                ],
            ),
            (
                BuiltInRole::ComplianceOfficer,
                2,
                "Compliance Officer",
                "#0d9488",
                "clipboard-check",
                &[
                    CanViewProjects,
                    CanViewCompliance,
                    CanManageCompliance,
                    CanManageRoles,
                    CanViewAuditLog,
                ],
            ),
            (
                BuiltInRole::Estimator,
                2,
                "Estimator",
                "#d97706",
                "calculator",
                &[
                    CanViewProjects,
                    CanViewQuotes,
                    CanCreateQuotes,
                    CanViewFinancials,
                ],
            ),
            (
                BuiltInRole::FieldTech,
                1,
                "Field Technician",
                "#16a34a",
                "hard-hat",
                &[CanViewProjects, CanCapturePhotos, CanViewCompliance],
            ),
            (
                BuiltInRole::Viewer,
                0,
                "Viewer",
                "#6b7280",
                "eye",
                &[CanViewProjects],
            ),
        ];

        let entries = rows
            .into_iter()
            .map(|(role, level, display_name, color, icon, granted)| {
                (
                    role,
                    CatalogEntry {
                        permissions: PermissionSet::from_granted(granted.iter().copied()),
                        level: RoleLevel::new(level),
                        display_name: display_name.to_owned(),
                        color: color.to_owned(),
                        icon: icon.to_owned(),
                    },
                )
            })
            .collect();

        Self {
            version: SUPPORTED_CATALOG_VERSION,
            entries,
            lowest_privilege: BuiltInRole::Viewer,
        }
    }

    /// Builds a catalog from a versioned document.
    ///
    /// Every built-in role must be defined exactly once, role and capability
    /// names must be known, the owner must hold the single highest level and the
    /// lowest level must be held by exactly one role.
    pub fn from_document(document: RoleCatalogDocument) -> AppResult<Self> {
        if document.version != SUPPORTED_CATALOG_VERSION {
            return Err(AppError::Validation(format!(
                "unsupported role catalog version {} (expected {SUPPORTED_CATALOG_VERSION})",
                document.version
            )));
        }

        let mut entries = BTreeMap::new();
        for row in document.roles {
            let role = BuiltInRole::from_str(row.name.as_str())?;
            let granted = row
                .permissions
                .iter()
                .map(|name| Capability::from_transport(name.as_str()))
                .collect::<AppResult<Vec<_>>>()?;

            let entry = CatalogEntry {
                permissions: PermissionSet::from_granted(granted),
                level: RoleLevel::new(row.level),
                display_name: row.display_name,
                color: row.color,
                icon: row.icon,
            };

            if entries.insert(role, entry).is_some() {
                return Err(AppError::Validation(format!(
                    "role catalog defines '{role}' more than once"
                )));
            }
        }

        if let Some(missing) = BuiltInRole::all()
            .iter()
            .find(|role| !entries.contains_key(role))
        {
            return Err(AppError::Validation(format!(
                "role catalog is missing built-in role '{missing}'"
            )));
        }

        let owner_level = entries
            .get(&BuiltInRole::Owner)
            .map(|entry| entry.level)
            .unwrap_or_default();
        if entries
            .iter()
            .any(|(role, entry)| *role != BuiltInRole::Owner && entry.level >= owner_level)
        {
            return Err(AppError::Validation(
                "role catalog must place 'owner' strictly above every other role".to_owned(),
            ));
        }

        let min_level = entries
            .values()
            .map(|entry| entry.level)
            .min()
            .unwrap_or_default();
        let lowest = entries
            .iter()
            .filter(|(_, entry)| entry.level == min_level)
            .map(|(role, _)| *role)
            .collect::<Vec<_>>();
        let [lowest_privilege] = lowest.as_slice() else {
            return Err(AppError::Validation(format!(
                "role catalog must have exactly one role at the lowest level {min_level}"
            )));
        };

        Ok(Self {
            version: document.version,
            entries,
            lowest_privilege: *lowest_privilege,
        })
    }

    /// Returns the document form of this catalog.
    #[must_use]
    pub fn to_document(&self) -> RoleCatalogDocument {
        RoleCatalogDocument {
            version: self.version,
            roles: self
                .entries
                .iter()
                .map(|(role, entry)| RoleCatalogDocumentEntry {
                    name: role.as_str().to_owned(),
                    level: entry.level.value(),
                    display_name: entry.display_name.clone(),
                    color: entry.color.clone(),
                    icon: entry.icon.clone(),
                    permissions: entry
                        .permissions
                        .granted()
                        .map(|capability| capability.as_str().to_owned())
                        .collect(),
                })
                .collect(),
        }
    }

    /// Returns the catalog document version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Resolves a built-in role name to its canonical permission set.
    pub fn resolve_built_in(&self, role_name: &str) -> AppResult<&PermissionSet> {
        let role = BuiltInRole::from_str(role_name)?;
        self.permissions(role)
    }

    /// Returns the canonical permission set of a built-in role.
    pub fn permissions(&self, role: BuiltInRole) -> AppResult<&PermissionSet> {
        self.entry(role).map(|entry| &entry.permissions)
    }

    /// Returns the hierarchy level of a built-in role name.
    pub fn level(&self, role_name: &str) -> AppResult<RoleLevel> {
        let role = BuiltInRole::from_str(role_name)?;
        self.level_of(role)
    }

    /// Returns the hierarchy level of a built-in role.
    pub fn level_of(&self, role: BuiltInRole) -> AppResult<RoleLevel> {
        self.entry(role).map(|entry| entry.level)
    }

    /// Returns the resolved role value for a built-in role.
    pub fn role(&self, role: BuiltInRole) -> AppResult<Role> {
        Ok(Role::BuiltIn {
            role,
            level: self.level_of(role)?,
        })
    }

    /// Returns the role used when resolution must fail closed.
    #[must_use]
    pub fn lowest_privilege(&self) -> BuiltInRole {
        self.lowest_privilege
    }

    /// Returns the owner level; custom roles must stay strictly below it.
    #[must_use]
    pub fn top_level(&self) -> RoleLevel {
        self.entries
            .get(&BuiltInRole::Owner)
            .map(|entry| entry.level)
            .unwrap_or_default()
    }

    /// Returns the presentation name of a built-in role.
    #[must_use]
    pub fn display_name(&self, role: BuiltInRole) -> Option<&str> {
        self.entries
            .get(&role)
            .map(|entry| entry.display_name.as_str())
    }

    /// Returns the presentation color of a built-in role.
    #[must_use]
    pub fn color(&self, role: BuiltInRole) -> Option<&str> {
        self.entries.get(&role).map(|entry| entry.color.as_str())
    }

    /// Returns the presentation icon of a built-in role.
    #[must_use]
    pub fn icon(&self, role: BuiltInRole) -> Option<&str> {
        self.entries.get(&role).map(|entry| entry.icon.as_str())
    }

    /// Returns the presentation name of any role.
    ///
    /// Custom roles present under their own name.
    #[must_use]
    pub fn role_display_name<'a>(&'a self, role: &'a Role) -> &'a str {
        match role {
            Role::BuiltIn { role, .. } => self.display_name(*role).unwrap_or(role.as_str()),
            Role::Custom(custom) => custom.name(),
        }
    }

    /// Returns the badge color of any role.
    #[must_use]
    pub fn role_color(&self, role: &Role) -> &str {
        match role {
            Role::BuiltIn { role, .. } => self.color(*role).unwrap_or(CUSTOM_ROLE_COLOR),
            Role::Custom(_) => CUSTOM_ROLE_COLOR,
        }
    }

    /// Returns the icon name of any role.
    #[must_use]
    pub fn role_icon(&self, role: &Role) -> &str {
        match role {
            Role::BuiltIn { role, .. } => self.icon(*role).unwrap_or(CUSTOM_ROLE_ICON),
            Role::Custom(_) => CUSTOM_ROLE_ICON,
        }
    }

    /// Iterates catalog rows in stable order.
    pub fn entries(&self) -> impl Iterator<Item = (BuiltInRole, &CatalogEntry)> {
        self.entries.iter().map(|(role, entry)| (*role, entry))
    }

    fn entry(&self, role: BuiltInRole) -> AppResult<&CatalogEntry> {
        self.entries.get(&role).ok_or_else(|| {
            AppError::UnknownRole(format!("built-in role '{role}' is not in the catalog"))
        })
    }
}

/// Decides whether an actor may act on a role.
///
/// True when the actor sits strictly above the target, or when the actor holds
/// `canManageRoles`, which overrides the level comparison.
#[must_use]
pub fn can_manage_role(
    actor_level: RoleLevel,
    actor_permissions: &PermissionSet,
    target_level: RoleLevel,
) -> bool {
    actor_level > target_level || actor_permissions.allows(Capability::CanManageRoles)
}

#[cfg(test)]
mod tests;
