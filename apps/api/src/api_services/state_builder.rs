use std::sync::Arc;

use fieldcrew_application::{
    AccessGuard, AuditLogRepository, AuditRepository, AuditTrail, CustomRoleRepository,
    CustomRoleService, InvitationRepository, InvitationService, PermissionResolver,
    RoleAssignmentRepository, TeamService,
};
use fieldcrew_core::AppError;
use fieldcrew_domain::RoleCatalog;
use fieldcrew_infrastructure::{
    PostgresAccessControlRepository, PostgresAuditLogRepository, PostgresAuditRepository,
    load_role_catalog,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Storage ports backing the access-control services.
pub(crate) struct AccessRepositories {
    pub custom_roles: Arc<dyn CustomRoleRepository>,
    pub assignments: Arc<dyn RoleAssignmentRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
}

pub(crate) struct AccessServices {
    pub access_guard: AccessGuard,
    pub custom_role_service: CustomRoleService,
    pub team_service: TeamService,
    pub invitation_service: InvitationService,
    pub audit_trail: AuditTrail,
}

pub(crate) fn build_access_services(
    catalog: RoleCatalog,
    repositories: AccessRepositories,
    invitation_ttl: chrono::Duration,
) -> AccessServices {
    let resolver = PermissionResolver::new(
        Arc::new(catalog),
        repositories.custom_roles.clone(),
        repositories.assignments.clone(),
    );
    let audit_trail = AuditTrail::new(repositories.audit, repositories.audit_log);

    AccessServices {
        access_guard: AccessGuard::new(resolver.clone()),
        custom_role_service: CustomRoleService::new(
            resolver.clone(),
            repositories.custom_roles,
            repositories.assignments.clone(),
            audit_trail.clone(),
        ),
        team_service: TeamService::new(
            resolver.clone(),
            repositories.assignments,
            audit_trail.clone(),
        ),
        invitation_service: InvitationService::new(
            resolver,
            repositories.invitations,
            audit_trail.clone(),
            invitation_ttl,
        ),
        audit_trail,
    }
}

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let catalog = load_role_catalog(config.role_catalog_path.as_deref()).await?;

    let access_control = Arc::new(PostgresAccessControlRepository::new(pool.clone()));
    let services = build_access_services(
        catalog,
        AccessRepositories {
            custom_roles: access_control.clone(),
            assignments: access_control.clone(),
            invitations: access_control,
            audit: Arc::new(PostgresAuditRepository::new(pool.clone())),
            audit_log: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        },
        config.invitation_ttl,
    );

    Ok(AppState {
        postgres_pool: pool,
        access_guard: services.access_guard,
        custom_role_service: services.custom_role_service,
        team_service: services.team_service,
        invitation_service: services.invitation_service,
        audit_trail: services.audit_trail,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
