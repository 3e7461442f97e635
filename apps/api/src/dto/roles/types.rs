use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-custom-role-request.ts"
)]
pub struct CreateCustomRoleRequest {
    pub name: String,
    pub level: u8,
    /// Capability flags; omitted capabilities are denied.
    pub permissions: BTreeMap<String, bool>,
}

/// Incoming payload for a full permission replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-custom-role-permissions-request.ts"
)]
pub struct UpdateCustomRolePermissionsRequest {
    pub permissions: BTreeMap<String, bool>,
    /// Version the editor loaded; a stale value is rejected.
    pub expected_version: Option<u32>,
}

/// Incoming payload for custom role deactivation.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/deactivate-custom-role-request.ts"
)]
pub struct DeactivateCustomRoleRequest {
    /// Role the current holders move to.
    pub reassign_to: Option<String>,
}

/// API representation of a built-in catalog role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-catalog-entry-response.ts"
)]
pub struct RoleCatalogEntryResponse {
    pub name: String,
    pub display_name: String,
    pub level: u8,
    pub color: String,
    pub icon: String,
    pub permissions: BTreeMap<String, bool>,
}

/// Presentation summary of any role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-summary-response.ts"
)]
pub struct RoleSummaryResponse {
    /// Assignment reference: built-in name or `custom:<uuid>`.
    pub reference: String,
    pub display_name: String,
    pub level: u8,
    pub color: String,
    pub icon: String,
}

/// API representation of a tenant custom role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/custom-role-response.ts"
)]
pub struct CustomRoleResponse {
    pub role_id: String,
    pub reference: String,
    pub name: String,
    pub level: u8,
    pub permissions: BTreeMap<String, bool>,
    pub is_active: bool,
    pub version: u32,
    /// Present on listings.
    #[ts(type = "number | null")]
    pub holders: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of a custom role deactivation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-deactivation-response.ts"
)]
pub struct RoleDeactivationResponse {
    pub role: CustomRoleResponse,
    pub reassigned_subjects: Vec<String>,
}
