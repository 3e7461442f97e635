use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use fieldcrew_application::{AuditLogEntry, AuditLogQuery, AuditLogRepository};
use fieldcrew_core::{AppError, AppResult, TenantId};

const MAX_OFFSET: usize = 5_000;

/// PostgreSQL-backed repository for audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: uuid::Uuid,
    actor: String,
    action: String,
    target_type: String,
    target_id: String,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let limit = query.limit.max(1) as i64;
        let offset = query.offset.min(MAX_OFFSET) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                actor,
                action,
                target_type,
                target_id,
                before_state,
                after_state,
                created_at
            FROM audit_log_entries
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR action = $2)
                AND ($3::TEXT IS NULL OR actor = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            OFFSET $5
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.actor)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(AuditLogEntry {
                    event_id: row.event_id.to_string(),
                    action: row.action.parse()?,
                    actor: row.actor,
                    target_type: row.target_type,
                    target_id: row.target_id,
                    before: row.before_state,
                    after: row.after_state,
                    occurred_at: row.created_at,
                })
            })
            .collect()
    }
}
