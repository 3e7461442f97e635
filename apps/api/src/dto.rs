mod audit;
mod auth;
mod common;
mod invitations;
mod roles;
mod team;

pub use audit::AuditLogEntryResponse;
pub use auth::BootstrapRequest;
pub use common::{
    HealthDependencyStatus, HealthResponse, PermissionCheckResponse, UserIdentityResponse,
};
pub use invitations::{
    AcceptInvitationRequest, InvitationResponse, IssuedInvitationResponse, SendInvitationRequest,
};
pub use roles::{
    CreateCustomRoleRequest, CustomRoleResponse, DeactivateCustomRoleRequest,
    RoleCatalogEntryResponse, RoleDeactivationResponse, RoleSummaryResponse,
    UpdateCustomRolePermissionsRequest,
};
pub use team::{AssignRoleRequest, RoleAssignmentResponse};

#[cfg(test)]
mod tests {
    use super::{
        AcceptInvitationRequest, AssignRoleRequest, AuditLogEntryResponse, BootstrapRequest,
        CreateCustomRoleRequest, CustomRoleResponse, DeactivateCustomRoleRequest,
        HealthDependencyStatus, HealthResponse, InvitationResponse, IssuedInvitationResponse,
        PermissionCheckResponse, RoleAssignmentResponse, RoleCatalogEntryResponse,
        RoleDeactivationResponse, RoleSummaryResponse, SendInvitationRequest,
        UpdateCustomRolePermissionsRequest, UserIdentityResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        BootstrapRequest::export(&config)?;
        CreateCustomRoleRequest::export(&config)?;
        UpdateCustomRolePermissionsRequest::export(&config)?;
        DeactivateCustomRoleRequest::export(&config)?;
        AssignRoleRequest::export(&config)?;
        SendInvitationRequest::export(&config)?;
        AcceptInvitationRequest::export(&config)?;
        RoleCatalogEntryResponse::export(&config)?;
        RoleSummaryResponse::export(&config)?;
        CustomRoleResponse::export(&config)?;
        RoleDeactivationResponse::export(&config)?;
        RoleAssignmentResponse::export(&config)?;
        InvitationResponse::export(&config)?;
        IssuedInvitationResponse::export(&config)?;
        AuditLogEntryResponse::export(&config)?;
        PermissionCheckResponse::export(&config)?;
        UserIdentityResponse::export(&config)?;
        HealthDependencyStatus::export(&config)?;
        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }
}
