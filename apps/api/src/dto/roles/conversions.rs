use fieldcrew_application::{CustomRoleListing, RoleDeactivation};
use fieldcrew_domain::{BuiltInRole, CatalogEntry, CustomRole, Role, RoleCatalog, RoleReference};

use super::types::{
    CustomRoleResponse, RoleCatalogEntryResponse, RoleDeactivationResponse, RoleSummaryResponse,
};

impl RoleCatalogEntryResponse {
    /// Creates a response from one catalog row.
    #[must_use]
    pub fn from_entry(role: BuiltInRole, entry: &CatalogEntry) -> Self {
        Self {
            name: role.as_str().to_owned(),
            display_name: entry.display_name.clone(),
            level: entry.level.value(),
            color: entry.color.clone(),
            icon: entry.icon.clone(),
            permissions: entry.permissions.to_flags(),
        }
    }
}

impl RoleSummaryResponse {
    /// Creates a summary using the catalog's presentation lookups.
    #[must_use]
    pub fn from_role(role: &Role, catalog: &RoleCatalog) -> Self {
        Self {
            reference: role.reference().to_string(),
            display_name: catalog.role_display_name(role).to_owned(),
            level: role.level().value(),
            color: catalog.role_color(role).to_owned(),
            icon: catalog.role_icon(role).to_owned(),
        }
    }
}

impl From<CustomRole> for CustomRoleResponse {
    fn from(value: CustomRole) -> Self {
        Self {
            role_id: value.id().to_string(),
            reference: RoleReference::Custom(value.id()).to_string(),
            name: value.name().to_owned(),
            level: value.level().value(),
            permissions: value.permissions().to_flags(),
            is_active: value.is_active(),
            version: value.version(),
            holders: None,
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}

impl From<CustomRoleListing> for CustomRoleResponse {
    fn from(value: CustomRoleListing) -> Self {
        Self {
            holders: Some(value.holders),
            ..Self::from(value.role)
        }
    }
}

impl From<RoleDeactivation> for RoleDeactivationResponse {
    fn from(value: RoleDeactivation) -> Self {
        Self {
            role: CustomRoleResponse::from(value.role),
            reassigned_subjects: value.reassigned_subjects,
        }
    }
}
