use async_trait::async_trait;
use sqlx::PgPool;

use fieldcrew_application::{AuditEvent, AuditRepository};
use fieldcrew_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                tenant_id,
                actor,
                action,
                target_type,
                target_id,
                before_state,
                after_state,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.actor)
        .bind(event.action.as_str())
        .bind(event.target_type)
        .bind(event.target_id)
        .bind(event.before)
        .bind(event.after)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
