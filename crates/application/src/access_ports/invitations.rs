use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldcrew_core::{AppResult, TenantId};
use fieldcrew_domain::{Invitation, InvitationId};

/// Repository port for tenant invitations.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores a freshly issued invitation.
    async fn create_invitation(&self, invitation: Invitation) -> AppResult<()>;

    /// Lists tenant invitations, newest first.
    async fn list_invitations(&self, tenant_id: TenantId) -> AppResult<Vec<Invitation>>;

    /// Moves a pending invitation to revoked.
    async fn revoke_invitation(
        &self,
        tenant_id: TenantId,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation>;

    /// Consumes the token and creates the role assignment in one atomic step.
    ///
    /// Exactly one concurrent caller can succeed for a token. Others observe
    /// `InvitationAlreadyConsumed`, `InvitationExpired` or `InvitationRevoked`.
    /// An unknown token fails with `Unauthenticated`. A subject that is already
    /// a tenant member, or an invited custom role that is no longer active,
    /// fails with `Conflict` and leaves the invitation pending.
    async fn accept_invitation(
        &self,
        tenant_id: TenantId,
        token_hash: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation>;

    /// Persists `pending -> expired` for overdue invitations across tenants.
    /// Returns the number of invitations moved.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
