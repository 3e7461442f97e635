use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for sending an invitation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/send-invitation-request.ts"
)]
pub struct SendInvitationRequest {
    pub email: String,
    /// Built-in role name or `custom:<uuid>`.
    pub role: String,
}

/// Incoming payload for accepting an invitation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accept-invitation-request.ts"
)]
pub struct AcceptInvitationRequest {
    pub token: String,
    /// Subject the new member signs in as.
    pub subject: String,
    pub display_name: Option<String>,
}

/// API representation of an invitation. The token hash is never exposed.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invitation-response.ts"
)]
pub struct InvitationResponse {
    pub invitation_id: String,
    pub email: String,
    pub role: String,
    /// `pending`, `accepted`, `expired` or `revoked`.
    pub status: String,
    pub invited_by: String,
    pub created_at: String,
    pub expires_at: String,
    pub accepted_by: Option<String>,
    pub resolved_at: Option<String>,
}

/// A freshly issued invitation with its one-time token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/issued-invitation-response.ts"
)]
pub struct IssuedInvitationResponse {
    pub invitation: InvitationResponse,
    /// Shown once; only its hash is stored.
    pub token: String,
}
