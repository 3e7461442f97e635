use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldcrew_core::{AppResult, TenantId};
use fieldcrew_domain::AuditAction;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Subject that performed the action.
    pub actor: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Target kind, e.g. `custom_role`.
    pub target_type: String,
    /// Target identifier.
    pub target_id: String,
    /// Snapshot of diffable fields before the change.
    pub before: Option<serde_json::Value>,
    /// Snapshot of diffable fields after the change.
    pub after: Option<serde_json::Value>,
    /// Time the mutation happened.
    pub occurred_at: DateTime<Utc>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Audit log entry projection for the reporting view.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Actor subject.
    pub actor: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Target kind.
    pub target_type: String,
    /// Target identifier.
    pub target_id: String,
    /// Snapshot before the change.
    pub before: Option<serde_json::Value>,
    /// Snapshot after the change.
    pub after: Option<serde_json::Value>,
    /// Event timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional action filter.
    pub action: Option<AuditAction>,
    /// Optional actor filter.
    pub actor: Option<String>,
}

/// Repository port for reading tenant audit logs.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists tenant audit entries, newest first.
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}
