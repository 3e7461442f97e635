use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use fieldcrew_core::AppError;
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::read_session_identity;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the caller with their freshly resolved role and capabilities.
pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = read_session_identity(&session).await?;
    let context = state.access_guard.authenticate(identity.as_ref()).await?;

    Ok(Json(UserIdentityResponse::from_context(
        &context,
        state.access_guard.resolver().catalog(),
    )))
}
