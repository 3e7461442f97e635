//! Shared primitives for all Rust crates in Fieldcrew.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::UserIdentity;

/// Result type used across Fieldcrew crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Tenant identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Application error taxonomy.
///
/// Authorization denials (`Unauthenticated`, `Forbidden`) are kept apart from
/// faults (`Internal`, `UnknownRole`) so callers never read "the system is
/// broken" as "you are not allowed".
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No valid session identity accompanied the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller is authenticated but lacks the required capability.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A role reference does not resolve to a known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A custom role with the same name already exists in the tenant.
    #[error("duplicate role name: {0}")]
    DuplicateName(String),

    /// Role deactivation blocked because users still hold the role.
    #[error("role '{role_id}' is still assigned to {holders} user(s)")]
    DanglingAssignment {
        /// Role that could not be deactivated.
        role_id: String,
        /// Number of users currently holding the role.
        holders: u64,
    },

    /// Invitation is past its expiry.
    #[error("invitation expired: {0}")]
    InvitationExpired(String),

    /// Invitation token was already used.
    #[error("invitation already consumed: {0}")]
    InvitationAlreadyConsumed(String),

    /// Invitation was revoked by an administrator.
    #[error("invitation revoked: {0}")]
    InvitationRevoked(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_trims_input() {
        let value = NonEmptyString::new("  Regional Lead ");
        assert_eq!(
            value.map(String::from).unwrap_or_default(),
            "Regional Lead"
        );
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn dangling_assignment_message_names_holder_count() {
        let error = AppError::DanglingAssignment {
            role_id: "r-1".to_owned(),
            holders: 3,
        };
        assert_eq!(error.to_string(), "role 'r-1' is still assigned to 3 user(s)");
    }
}
