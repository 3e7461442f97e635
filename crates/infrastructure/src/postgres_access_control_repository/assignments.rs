use super::*;

impl PostgresAccessControlRepository {
    pub(super) async fn find_assignment_impl(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT tenant_id, subject, role, assigned_at
            FROM role_assignments
            WHERE tenant_id = $1 AND subject = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role assignment: {error}")))?
        .map(RoleAssignment::try_from)
        .transpose()
    }

    pub(super) async fn list_assignments_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RoleAssignment>> {
        sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT tenant_id, subject, role, assigned_at
            FROM role_assignments
            WHERE tenant_id = $1
            ORDER BY subject
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?
        .into_iter()
        .map(RoleAssignment::try_from)
        .collect()
    }

    pub(super) async fn count_holders_impl(
        &self,
        tenant_id: TenantId,
        role: RoleReference,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM role_assignments
            WHERE tenant_id = $1 AND role = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role holders: {error}")))?;

        Ok(count.max(0) as u64)
    }

    pub(super) async fn replace_assignment_impl(
        &self,
        tenant_id: TenantId,
        subject: &str,
        expected: RoleReference,
        role: RoleReference,
    ) -> AppResult<AssignmentChange> {
        let mut transaction = self.begin().await?;

        let previous = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM role_assignments
            WHERE tenant_id = $1 AND subject = $2
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role assignment: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "subject '{subject}' is not a member of tenant '{tenant_id}'"
            ))
        })?;

        let previous = RoleReference::parse(previous.as_str())?;
        if previous != expected {
            return Err(AppError::Conflict(format!(
                "subject '{subject}' now holds '{previous}', not '{expected}'"
            )));
        }

        lock_active_custom_role(&mut transaction, tenant_id, role).await?;

        let row = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            UPDATE role_assignments
            SET role = $3, assigned_at = now()
            WHERE tenant_id = $1 AND subject = $2
            RETURNING tenant_id, subject, role, assigned_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(role.to_string())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to replace role assignment: {error}")))?;

        commit(transaction).await?;

        Ok(AssignmentChange {
            previous,
            current: RoleAssignment::try_from(row)?,
        })
    }

    pub(super) async fn assign_if_tenant_empty_impl(
        &self,
        tenant_id: TenantId,
        subject: &str,
        role: RoleReference,
    ) -> AppResult<bool> {
        let mut transaction = self.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT, 0))")
            .bind(tenant_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to lock tenant: {error}")))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO role_assignments (tenant_id, subject, role)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (
                SELECT 1 FROM role_assignments WHERE tenant_id = $1
            )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(role.to_string())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bootstrap tenant owner: {error}")))?
        .rows_affected();

        commit(transaction).await?;

        Ok(inserted == 1)
    }
}
