use super::*;

const ROLE_COLUMNS: &str =
    "id, tenant_id, name, level, permissions, is_active, version, created_at, updated_at";

impl PostgresAccessControlRepository {
    pub(super) async fn create_role_impl(&self, role: CustomRole) -> AppResult<CustomRole> {
        let row = sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            INSERT INTO custom_roles (
                id, tenant_id, name, level, permissions, is_active, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().as_uuid())
        .bind(role.name())
        .bind(i16::from(role.level().value()))
        .bind(Json(role.permissions()))
        .bind(role.is_active())
        .bind(version_param(role.version())?)
        .bind(role.created_at())
        .bind(role.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_role_name_conflict(error, role.name()))?;

        CustomRole::try_from(row)
    }

    pub(super) async fn find_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
    ) -> AppResult<Option<CustomRole>> {
        sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM custom_roles
            WHERE tenant_id = $1 AND id = $2
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find custom role: {error}")))?
        .map(CustomRole::try_from)
        .transpose()
    }

    pub(super) async fn list_roles_impl(&self, tenant_id: TenantId) -> AppResult<Vec<CustomRole>> {
        sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM custom_roles
            WHERE tenant_id = $1
            ORDER BY lower(name)
            "#
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list custom roles: {error}")))?
        .into_iter()
        .map(CustomRole::try_from)
        .collect()
    }

    pub(super) async fn replace_permissions_impl(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        permissions: PermissionSet,
        expected_version: Option<u32>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<CustomRole> {
        let expected_version = expected_version.map(version_param).transpose()?;
        let updated = sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            UPDATE custom_roles
            SET permissions = $3,
                version = version + 1,
                updated_at = $5
            WHERE tenant_id = $1
                AND id = $2
                AND is_active
                AND ($4::INTEGER IS NULL OR version = $4)
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(Json(&permissions))
        .bind(expected_version)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update custom role permissions: {error}"))
        })?;

        if let Some(row) = updated {
            return CustomRole::try_from(row);
        }

        let current = self.find_role_impl(tenant_id, role_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
            ))
        })?;
        current.ensure_active()?;

        Err(AppError::Conflict(format!(
            "custom role '{role_id}' is at version {}, not {}",
            current.version(),
            expected_version.unwrap_or_default()
        )))
    }

    pub(super) async fn deactivate_role_impl(
        &self,
        tenant_id: TenantId,
        role_id: CustomRoleId,
        reassign_to: Option<RoleReference>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<RoleDeactivation> {
        let mut transaction = self.begin().await?;

        let current = sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM custom_roles
            WHERE tenant_id = $1 AND id = $2
            FOR UPDATE
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock custom role: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "custom role '{role_id}' does not exist in tenant '{tenant_id}'"
            ))
        })?;
        CustomRole::try_from(current)?.ensure_active()?;

        let reference = RoleReference::Custom(role_id).to_string();
        let holders = sqlx::query_scalar::<_, String>(
            r#"
            SELECT subject
            FROM role_assignments
            WHERE tenant_id = $1 AND role = $2
            ORDER BY subject
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(reference.as_str())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role holders: {error}")))?;

        let reassigned_subjects = match reassign_to {
            None if !holders.is_empty() => {
                return Err(AppError::DanglingAssignment {
                    role_id: role_id.to_string(),
                    holders: holders.len() as u64,
                });
            }
            None => Vec::new(),
            Some(target) => {
                lock_active_custom_role(&mut transaction, tenant_id, target).await?;

                sqlx::query(
                    r#"
                    UPDATE role_assignments
                    SET role = $3, assigned_at = $4
                    WHERE tenant_id = $1 AND role = $2
                    "#,
                )
                .bind(tenant_id.as_uuid())
                .bind(reference.as_str())
                .bind(target.to_string())
                .bind(updated_at)
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to reassign role holders: {error}"))
                })?;

                holders
            }
        };

        let row = sqlx::query_as::<_, CustomRoleRow>(&format!(
            r#"
            UPDATE custom_roles
            SET is_active = false,
                version = version + 1,
                updated_at = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(updated_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to deactivate custom role: {error}")))?;

        commit(transaction).await?;

        Ok(RoleDeactivation {
            role: CustomRole::try_from(row)?,
            reassigned_subjects,
        })
    }
}

fn version_param(version: u32) -> AppResult<i32> {
    i32::try_from(version)
        .map_err(|_| AppError::Validation(format!("role version {version} is out of range")))
}

fn map_role_name_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::DuplicateName(format!("custom role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to create custom role: {error}"))
}
