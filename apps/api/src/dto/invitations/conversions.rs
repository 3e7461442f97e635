use chrono::{DateTime, Utc};
use fieldcrew_application::IssuedInvitation;
use fieldcrew_domain::Invitation;

use super::types::{InvitationResponse, IssuedInvitationResponse};

impl InvitationResponse {
    /// Creates a response with the status as observed at `now`.
    ///
    /// Overdue pending invitations report `expired` before the sweep runs.
    #[must_use]
    pub fn from_invitation(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        let parts = invitation.parts();
        Self {
            invitation_id: parts.id.to_string(),
            email: parts.email.as_str().to_owned(),
            role: parts.role.to_string(),
            status: invitation.status_at(now).as_str().to_owned(),
            invited_by: parts.invited_by.clone(),
            created_at: parts.created_at.to_rfc3339(),
            expires_at: parts.expires_at.to_rfc3339(),
            accepted_by: parts.accepted_by.clone(),
            resolved_at: parts.resolved_at.map(|value| value.to_rfc3339()),
        }
    }
}

impl IssuedInvitationResponse {
    /// Creates a response for a newly sent invitation.
    #[must_use]
    pub fn from_issued(issued: IssuedInvitation, now: DateTime<Utc>) -> Self {
        Self {
            invitation: InvitationResponse::from_invitation(&issued.invitation, now),
            token: issued.token,
        }
    }
}
