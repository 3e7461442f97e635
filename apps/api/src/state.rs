use fieldcrew_application::{
    AccessGuard, AuditTrail, CustomRoleService, InvitationService, TeamService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub postgres_pool: PgPool,
    pub access_guard: AccessGuard,
    pub custom_role_service: CustomRoleService,
    pub team_service: TeamService,
    pub invitation_service: InvitationService,
    pub audit_trail: AuditTrail,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
