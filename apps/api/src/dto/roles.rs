mod conversions;
mod types;

pub use types::{
    CreateCustomRoleRequest, CustomRoleResponse, DeactivateCustomRoleRequest,
    RoleCatalogEntryResponse, RoleDeactivationResponse, RoleSummaryResponse,
    UpdateCustomRolePermissionsRequest,
};
