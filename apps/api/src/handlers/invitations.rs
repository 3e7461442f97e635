use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use fieldcrew_application::SendInvitationInput;
use fieldcrew_core::UserIdentity;
use fieldcrew_domain::{Capability, InvitationId, RoleReference};
use tower_sessions::Session;
use tracing::info;

use crate::auth::establish_session;
use crate::dto::{
    AcceptInvitationRequest, InvitationResponse, IssuedInvitationResponse, SendInvitationRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_invitations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanInviteUsers)
        .await?;

    let now = Utc::now();
    let invitations = state
        .invitation_service
        .list_invitations(&context)
        .await?
        .iter()
        .map(|invitation| InvitationResponse::from_invitation(invitation, now))
        .collect();

    Ok(Json(invitations))
}

pub async fn send_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SendInvitationRequest>,
) -> ApiResult<(StatusCode, Json<IssuedInvitationResponse>)> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanInviteUsers)
        .await?;

    let issued = state
        .invitation_service
        .send_invitation(
            &context,
            SendInvitationInput {
                email: payload.email,
                role: RoleReference::parse(payload.role.as_str())?,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssuedInvitationResponse::from_issued(issued, Utc::now())),
    ))
}

pub async fn revoke_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invitation_id): Path<String>,
) -> ApiResult<Json<InvitationResponse>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanInviteUsers)
        .await?;

    let invitation = state
        .invitation_service
        .revoke_invitation(&context, InvitationId::parse(invitation_id.as_str())?)
        .await?;

    Ok(Json(InvitationResponse::from_invitation(
        &invitation,
        Utc::now(),
    )))
}

/// Accepts an invitation and signs the new member in.
///
/// The token alone authorizes this call; no prior session is needed.
pub async fn accept_invitation_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AcceptInvitationRequest>,
) -> ApiResult<Json<InvitationResponse>> {
    let subject = payload.subject.trim();
    let invitation = state
        .invitation_service
        .accept_invitation(payload.token.as_str(), subject)
        .await?;

    let display_name = payload
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(subject);
    let identity = UserIdentity::new(
        subject,
        display_name,
        Some(invitation.email().as_str().to_owned()),
        invitation.tenant_id(),
    );
    establish_session(&session, &identity).await?;

    info!(
        tenant_id = %invitation.tenant_id(),
        subject,
        "invitation accepted and session established"
    );

    Ok(Json(InvitationResponse::from_invitation(
        &invitation,
        Utc::now(),
    )))
}
