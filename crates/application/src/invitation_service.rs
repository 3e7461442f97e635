use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fieldcrew_core::{AppError, AppResult};
use fieldcrew_domain::{
    AuditAction, Capability, EmailAddress, Invitation, InvitationId, RoleReference,
};
use tracing::info;

use crate::{
    AuditTarget, AuditTrail, AuthorizedContext, InvitationRepository, PermissionResolver,
    snapshots,
};

mod token_crypto;

const AUDIT_TARGET: &str = "invitation";

/// Default invitation lifetime.
pub const DEFAULT_INVITATION_TTL_HOURS: i64 = 168;

/// Input payload for sending an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendInvitationInput {
    /// Invitee email address.
    pub email: String,
    /// Role granted on acceptance.
    pub role: RoleReference,
}

/// Freshly issued invitation with its one-time raw token.
///
/// The raw token is returned once and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedInvitation {
    /// Stored invitation.
    pub invitation: Invitation,
    /// Raw acceptance token for delivery to the invitee.
    pub token: String,
}

/// Application service for the invitation lifecycle.
#[derive(Clone)]
pub struct InvitationService {
    resolver: PermissionResolver,
    repository: Arc<dyn InvitationRepository>,
    audit_trail: AuditTrail,
    ttl: Duration,
}

impl InvitationService {
    /// Creates the service with the invitation lifetime.
    #[must_use]
    pub fn new(
        resolver: PermissionResolver,
        repository: Arc<dyn InvitationRepository>,
        audit_trail: AuditTrail,
        ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            repository,
            audit_trail,
            ttl,
        }
    }

    /// Issues an invitation for a role the caller may manage.
    pub async fn send_invitation(
        &self,
        context: &AuthorizedContext,
        input: SendInvitationInput,
    ) -> AppResult<IssuedInvitation> {
        context.ensure(Capability::CanInviteUsers)?;

        let email = EmailAddress::new(input.email)?;
        let role = self
            .resolver
            .assignable_role(context.tenant_id(), input.role)
            .await?;
        context.ensure_can_manage(&role)?;

        let token = token_crypto::generate_token(context.tenant_id())?;
        let invitation = Invitation::issue(
            context.tenant_id(),
            email,
            input.role,
            token.hash,
            context.subject(),
            Utc::now(),
            self.ttl,
        )?;

        self.repository.create_invitation(invitation.clone()).await?;
        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::InvitationSent,
                AuditTarget::new(AUDIT_TARGET, invitation.id().to_string()),
                None,
                Some(snapshots::invitation(&invitation)),
            )
            .await;

        Ok(IssuedInvitation {
            invitation,
            token: token.raw,
        })
    }

    /// Lists tenant invitations.
    pub async fn list_invitations(&self, context: &AuthorizedContext) -> AppResult<Vec<Invitation>> {
        context.ensure(Capability::CanInviteUsers)?;
        self.repository.list_invitations(context.tenant_id()).await
    }

    /// Revokes a pending invitation.
    pub async fn revoke_invitation(
        &self,
        context: &AuthorizedContext,
        invitation_id: InvitationId,
    ) -> AppResult<Invitation> {
        context.ensure(Capability::CanInviteUsers)?;

        let revoked = self
            .repository
            .revoke_invitation(context.tenant_id(), invitation_id, Utc::now())
            .await?;

        self.audit_trail
            .record(
                context.tenant_id(),
                context.subject(),
                AuditAction::InvitationRevoked,
                AuditTarget::new(AUDIT_TARGET, invitation_id.to_string()),
                None,
                Some(snapshots::invitation(&revoked)),
            )
            .await;

        Ok(revoked)
    }

    /// Consumes an invitation token for `subject`, creating their assignment.
    ///
    /// Exactly one of any concurrent acceptances of the same token succeeds.
    pub async fn accept_invitation(&self, raw_token: &str, subject: &str) -> AppResult<Invitation> {
        if subject.trim().is_empty() {
            return Err(AppError::Validation(
                "accepting subject must not be empty".to_owned(),
            ));
        }

        let tenant_id = token_crypto::token_tenant(raw_token)?;
        let token_hash = token_crypto::hash_token(raw_token);

        let accepted = self
            .repository
            .accept_invitation(tenant_id, token_hash.as_str(), subject, Utc::now())
            .await?;

        self.audit_trail
            .record(
                tenant_id,
                subject,
                AuditAction::InvitationAccepted,
                AuditTarget::new(AUDIT_TARGET, accepted.id().to_string()),
                None,
                Some(snapshots::invitation(&accepted)),
            )
            .await;

        Ok(accepted)
    }

    /// Persists expiry for overdue pending invitations across tenants.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let expired = self.repository.expire_overdue(now).await?;
        if expired > 0 {
            info!(expired, "expired overdue invitations");
        }

        Ok(expired)
    }
}
