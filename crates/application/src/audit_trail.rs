use std::sync::Arc;

use chrono::Utc;
use fieldcrew_core::{AppResult, TenantId};
use fieldcrew_domain::{AuditAction, Capability};
use serde_json::Value;
use tracing::error;

use crate::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
    AuthorizedContext,
};

/// Largest page the audit log listing returns.
pub const AUDIT_LOG_MAX_LIMIT: usize = 200;

/// Target of an audited mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTarget {
    /// Target kind, e.g. `custom_role`.
    pub kind: &'static str,
    /// Target identifier.
    pub id: String,
}

impl AuditTarget {
    /// Creates a target reference.
    #[must_use]
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Append-only record of privilege mutations.
#[derive(Clone)]
pub struct AuditTrail {
    repository: Arc<dyn AuditRepository>,
    log_repository: Arc<dyn AuditLogRepository>,
}

impl AuditTrail {
    /// Creates the trail from its write and read ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditRepository>,
        log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            repository,
            log_repository,
        }
    }

    /// Records a mutation that has already been applied.
    ///
    /// Persistence failures are logged and swallowed; the mutation stands.
    pub async fn record(
        &self,
        tenant_id: TenantId,
        actor: &str,
        action: AuditAction,
        target: AuditTarget,
        before: Option<Value>,
        after: Option<Value>,
    ) {
        let event = AuditEvent {
            tenant_id,
            actor: actor.to_owned(),
            action,
            target_type: target.kind.to_owned(),
            target_id: target.id.clone(),
            before,
            after,
            occurred_at: Utc::now(),
        };

        if let Err(record_error) = self.repository.append_event(event).await {
            error!(
                tenant_id = %tenant_id,
                actor,
                action = action.as_str(),
                target_type = target.kind,
                target_id = target.id.as_str(),
                error = %record_error,
                "failed to record audit event"
            );
        }
    }

    /// Lists recent tenant audit entries.
    pub async fn list(
        &self,
        context: &AuthorizedContext,
        mut query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        context.ensure(Capability::CanViewAuditLog)?;
        query.limit = query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT);

        self.log_repository
            .list_recent_entries(context.tenant_id(), query)
            .await
    }
}
