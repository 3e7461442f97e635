use fieldcrew_application::RoleAssignment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for moving a member to another role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    /// Built-in role name or `custom:<uuid>`.
    pub role: String,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub subject: String,
    pub role: String,
    pub assigned_at: String,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            subject: value.subject,
            role: value.role.to_string(),
            assigned_at: value.assigned_at.to_rfc3339(),
        }
    }
}
