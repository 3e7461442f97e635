use fieldcrew_application::{AuthorizedContext, PermissionSource};
use fieldcrew_domain::RoleCatalog;
use serde::Serialize;
use ts_rs::TS;

use super::roles::RoleSummaryResponse;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub tenant_id: String,
    /// Resolved role; absent when the caller holds no assignment in the tenant.
    pub role: Option<RoleSummaryResponse>,
    /// `assigned`, `lowest_privilege_fallback` or `unassigned`.
    pub permission_source: String,
    /// Granted capability names. UI affordances key off this list.
    pub capabilities: Vec<String>,
}

impl UserIdentityResponse {
    /// Creates a response from a freshly resolved context.
    #[must_use]
    pub fn from_context(context: &AuthorizedContext, catalog: &RoleCatalog) -> Self {
        let identity = context.identity();
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            tenant_id: identity.tenant_id().to_string(),
            role: context
                .role()
                .map(|role| RoleSummaryResponse::from_role(role, catalog)),
            permission_source: permission_source_name(context.effective().source).to_owned(),
            capabilities: context
                .permissions()
                .granted()
                .map(|capability| capability.as_str().to_owned())
                .collect(),
        }
    }
}

/// Result of a single capability check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub capability: String,
    pub allowed: bool,
}

fn permission_source_name(source: PermissionSource) -> &'static str {
    match source {
        PermissionSource::Assigned => "assigned",
        PermissionSource::LowestPrivilegeFallback => "lowest_privilege_fallback",
        PermissionSource::Unassigned => "unassigned",
    }
}
