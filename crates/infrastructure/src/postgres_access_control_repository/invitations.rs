use super::*;

const INVITATION_COLUMNS: &str = "id, tenant_id, email, role, token_hash, invited_by, status, \
     created_at, expires_at, accepted_by, resolved_at";

impl PostgresAccessControlRepository {
    pub(super) async fn create_invitation_impl(&self, invitation: Invitation) -> AppResult<()> {
        let parts = invitation.parts();
        sqlx::query(
            r#"
            INSERT INTO invitations (
                id, tenant_id, email, role, token_hash, invited_by, status,
                created_at, expires_at, accepted_by, resolved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(parts.id.as_uuid())
        .bind(parts.tenant_id.as_uuid())
        .bind(parts.email.as_str())
        .bind(parts.role.to_string())
        .bind(parts.token_hash.as_str())
        .bind(parts.invited_by.as_str())
        .bind(parts.status.as_str())
        .bind(parts.created_at)
        .bind(parts.expires_at)
        .bind(parts.accepted_by.as_deref())
        .bind(parts.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create invitation: {error}")))?;

        Ok(())
    }

    pub(super) async fn list_invitations_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list invitations: {error}")))?
        .into_iter()
        .map(Invitation::try_from)
        .collect()
    }

    pub(super) async fn revoke_invitation_impl(
        &self,
        tenant_id: TenantId,
        invitation_id: InvitationId,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let mut transaction = self.begin().await?;

        let mut invitation = lock_invitation(
            &mut transaction,
            "WHERE tenant_id = $1 AND id = $2",
            tenant_id,
            InvitationKey::Id(invitation_id),
        )
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "invitation '{invitation_id}' does not exist in tenant '{tenant_id}'"
            ))
        })?;

        invitation.revoke(now)?;
        persist_resolution(&mut transaction, &invitation).await?;
        commit(transaction).await?;

        Ok(invitation)
    }

    pub(super) async fn accept_invitation_impl(
        &self,
        tenant_id: TenantId,
        token_hash: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Invitation> {
        let mut transaction = self.begin().await?;

        let mut invitation = lock_invitation(
            &mut transaction,
            "WHERE tenant_id = $1 AND token_hash = $2",
            tenant_id,
            InvitationKey::TokenHash(token_hash),
        )
        .await?
        .ok_or_else(|| AppError::Unauthenticated("invitation token is not recognized".to_owned()))?;

        invitation.ensure_acceptable(now)?;

        let already_member = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role_assignments WHERE tenant_id = $1 AND subject = $2
            )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check membership: {error}")))?;

        if already_member {
            return Err(AppError::Conflict(format!(
                "subject '{subject}' is already a member of tenant '{tenant_id}'"
            )));
        }

        lock_active_custom_role(&mut transaction, tenant_id, invitation.role())
            .await
            .map_err(|error| match error {
                AppError::NotFound(message) => AppError::Conflict(message),
                other => other,
            })?;

        invitation.accept(subject, now)?;
        persist_resolution(&mut transaction, &invitation).await?;

        sqlx::query(
            r#"
            INSERT INTO role_assignments (tenant_id, subject, role, assigned_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(invitation.role().to_string())
        .bind(now)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_membership_conflict(error, tenant_id, subject))?;

        commit(transaction).await?;

        Ok(invitation)
    }

    /// Process-wide sweep with no tenant filter. It only moves overdue pending
    /// rows to expired and returns a count, never row data.
    pub(super) async fn expire_overdue_impl(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', resolved_at = $1
            WHERE status = 'pending' AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expire invitations: {error}")))?;

        Ok(result.rows_affected())
    }
}

fn map_membership_conflict(error: sqlx::Error, tenant_id: TenantId, subject: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "subject '{subject}' is already a member of tenant '{tenant_id}'"
        ));
    }

    AppError::Internal(format!("failed to create role assignment: {error}"))
}

enum InvitationKey<'a> {
    Id(InvitationId),
    TokenHash(&'a str),
}

async fn lock_invitation(
    transaction: &mut Transaction<'_, Postgres>,
    filter: &str,
    tenant_id: TenantId,
    key: InvitationKey<'_>,
) -> AppResult<Option<Invitation>> {
    let sql = format!("SELECT {INVITATION_COLUMNS} FROM invitations {filter} FOR UPDATE");
    let query = sqlx::query_as::<_, InvitationRow>(&sql).bind(tenant_id.as_uuid());
    let query = match key {
        InvitationKey::Id(invitation_id) => query.bind(invitation_id.as_uuid()),
        InvitationKey::TokenHash(token_hash) => query.bind(token_hash),
    };

    query
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock invitation: {error}")))?
        .map(Invitation::try_from)
        .transpose()
}

async fn persist_resolution(
    transaction: &mut Transaction<'_, Postgres>,
    invitation: &Invitation,
) -> AppResult<()> {
    let parts = invitation.parts();
    sqlx::query(
        r#"
        UPDATE invitations
        SET status = $3, accepted_by = $4, resolved_at = $5
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(parts.tenant_id.as_uuid())
    .bind(parts.id.as_uuid())
    .bind(parts.status.as_str())
    .bind(parts.accepted_by.as_deref())
    .bind(parts.resolved_at)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to update invitation: {error}")))?;

    Ok(())
}
