use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use fieldcrew_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/roles/catalog",
            get(handlers::roles::role_catalog_handler),
        )
        .route(
            "/api/roles/custom",
            get(handlers::roles::list_custom_roles_handler)
                .post(handlers::roles::create_custom_role_handler),
        )
        .route(
            "/api/roles/custom/{role_id}/permissions",
            put(handlers::roles::update_custom_role_permissions_handler),
        )
        .route(
            "/api/roles/custom/{role_id}/deactivate",
            post(handlers::roles::deactivate_custom_role_handler),
        )
        .route(
            "/api/team/assignments",
            get(handlers::team::list_assignments_handler),
        )
        .route(
            "/api/team/assignments/{subject}",
            put(handlers::team::assign_role_handler),
        )
        .route(
            "/api/invitations",
            get(handlers::invitations::list_invitations_handler)
                .post(handlers::invitations::send_invitation_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/revoke",
            post(handlers::invitations::revoke_invitation_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route(
            "/api/permissions/check/{capability}",
            get(handlers::permissions::check_permission_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/api/invitations/accept",
            post(handlers::invitations::accept_invitation_handler),
        )
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
