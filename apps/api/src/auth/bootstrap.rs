use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use fieldcrew_core::{AppError, TenantId, UserIdentity};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::establish_session;

/// Opens a session with the shared bootstrap token.
///
/// Without a tenant id a fresh tenant is created. The first subject to
/// bootstrap into an empty tenant becomes its owner; later subjects get a
/// session but only the permissions their assignment grants.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        warn!("rejected bootstrap attempt with invalid token");
        return Err(AppError::Unauthenticated("invalid bootstrap token".to_owned()).into());
    }

    let subject = payload.subject.trim();
    if subject.is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    let tenant_id = match payload.tenant_id.as_deref() {
        Some(value) => uuid::Uuid::parse_str(value.trim())
            .map(TenantId::from_uuid)
            .map_err(|error| AppError::Validation(format!("invalid tenant id: {error}")))?,
        None => TenantId::new(),
    };

    let became_owner = state
        .team_service
        .bootstrap_owner(tenant_id, subject)
        .await?;

    let identity = UserIdentity::new(subject, subject, None, tenant_id);
    establish_session(&session, &identity).await?;

    info!(%tenant_id, subject, became_owner, "bootstrap session established");
    Ok(StatusCode::NO_CONTENT)
}
