//! Invitation state machine.
//!
//! `pending -> accepted | expired | revoked`. All three targets are terminal.
//! A pending invitation past its expiry is reported as expired even before the
//! sweep persists the transition.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use fieldcrew_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EmailAddress, RoleReference};

/// Identifier of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvitationId(Uuid);

impl InvitationId {
    /// Creates a random invitation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a transport value.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid invitation id '{value}': {error}"))
        })
    }
}

impl Default for InvitationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InvitationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting acceptance.
    Pending,
    /// Accepted; the role assignment exists.
    Accepted,
    /// Expiry passed before acceptance.
    Expired,
    /// Withdrawn by an administrator.
    Revoked,
}

impl InvitationStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for InvitationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            _ => Err(AppError::Internal(format!(
                "unknown invitation status '{value}'"
            ))),
        }
    }
}

/// Plain field bag used to build or persist an [`Invitation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationParts {
    /// Invitation id.
    pub id: InvitationId,
    /// Tenant the invitee joins.
    pub tenant_id: TenantId,
    /// Invitee email.
    pub email: EmailAddress,
    /// Role assigned on acceptance.
    pub role: RoleReference,
    /// SHA-256 hex digest of the acceptance token.
    pub token_hash: String,
    /// Subject that sent the invitation.
    pub invited_by: String,
    /// Stored state.
    pub status: InvitationStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Acceptance deadline.
    pub expires_at: DateTime<Utc>,
    /// Subject created or linked on acceptance.
    pub accepted_by: Option<String>,
    /// Time of the terminal transition.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Pending or resolved role invitation for an email address within a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    parts: InvitationParts,
}

impl Invitation {
    /// Creates a pending invitation valid for `ttl`.
    pub fn issue(
        tenant_id: TenantId,
        email: EmailAddress,
        role: RoleReference,
        token_hash: String,
        invited_by: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AppResult<Self> {
        if ttl <= Duration::zero() {
            return Err(AppError::Validation(
                "invitation lifetime must be positive".to_owned(),
            ));
        }
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Validation(format!(
                "invitation lifetime of {} hours is out of range",
                ttl.num_hours()
            ))
        })?;

        Ok(Self {
            parts: InvitationParts {
                id: InvitationId::new(),
                tenant_id,
                email,
                role,
                token_hash,
                invited_by: invited_by.into(),
                status: InvitationStatus::Pending,
                created_at: now,
                expires_at,
                accepted_by: None,
                resolved_at: None,
            },
        })
    }

    /// Rebuilds an invitation from persisted state.
    #[must_use]
    pub fn from_parts(parts: InvitationParts) -> Self {
        Self { parts }
    }

    /// Returns the persisted field bag.
    #[must_use]
    pub fn parts(&self) -> &InvitationParts {
        &self.parts
    }

    /// Returns the invitation id.
    #[must_use]
    pub fn id(&self) -> InvitationId {
        self.parts.id
    }

    /// Returns the tenant the invitee joins.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.parts.tenant_id
    }

    /// Returns the invitee email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.parts.email
    }

    /// Returns the role granted on acceptance.
    #[must_use]
    pub fn role(&self) -> RoleReference {
        self.parts.role
    }

    /// Returns the token digest.
    #[must_use]
    pub fn token_hash(&self) -> &str {
        self.parts.token_hash.as_str()
    }

    /// Returns the stored status without applying expiry.
    #[must_use]
    pub fn stored_status(&self) -> InvitationStatus {
        self.parts.status
    }

    /// Returns the status as of `now`; overdue pending invitations read as expired.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.parts.status {
            InvitationStatus::Pending if now >= self.parts.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Fails with the state-machine error matching why acceptance is impossible.
    pub fn ensure_acceptable(&self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status_at(now) {
            InvitationStatus::Pending => Ok(()),
            InvitationStatus::Accepted => Err(AppError::InvitationAlreadyConsumed(format!(
                "invitation '{}' was already accepted",
                self.parts.id
            ))),
            InvitationStatus::Expired => Err(AppError::InvitationExpired(format!(
                "invitation '{}' expired at {}",
                self.parts.id,
                self.parts.expires_at.to_rfc3339()
            ))),
            InvitationStatus::Revoked => Err(AppError::InvitationRevoked(format!(
                "invitation '{}' was revoked",
                self.parts.id
            ))),
        }
    }

    /// Transitions `pending -> accepted`.
    pub fn accept(&mut self, subject: impl Into<String>, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_acceptable(now)?;
        self.parts.status = InvitationStatus::Accepted;
        self.parts.accepted_by = Some(subject.into());
        self.parts.resolved_at = Some(now);
        Ok(())
    }

    /// Transitions `pending -> revoked`.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status_at(now) {
            InvitationStatus::Pending => {
                self.parts.status = InvitationStatus::Revoked;
                self.parts.resolved_at = Some(now);
                Ok(())
            }
            status => Err(AppError::Conflict(format!(
                "invitation '{}' is {} and cannot be revoked",
                self.parts.id,
                status.as_str()
            ))),
        }
    }

    /// Persists `pending -> expired` when overdue. Returns whether it changed.
    pub fn expire_if_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.parts.status == InvitationStatus::Pending && now >= self.parts.expires_at {
            self.parts.status = InvitationStatus::Expired;
            self.parts.resolved_at = Some(now);
            return true;
        }

        false
    }
}
