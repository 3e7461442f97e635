use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fieldcrew_application::{CreateCustomRoleInput, UpdateCustomRolePermissionsInput};
use fieldcrew_core::{AppResult, UserIdentity};
use fieldcrew_domain::{Capability, CustomRoleId, PermissionSet, RoleReference};

use crate::dto::{
    CreateCustomRoleRequest, CustomRoleResponse, DeactivateCustomRoleRequest,
    RoleCatalogEntryResponse, RoleDeactivationResponse, UpdateCustomRolePermissionsRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists built-in roles with their canonical permissions and presentation.
pub async fn role_catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleCatalogEntryResponse>>> {
    state.access_guard.authenticate(Some(&user)).await?;

    let entries = state
        .access_guard
        .resolver()
        .catalog()
        .entries()
        .map(|(role, entry)| RoleCatalogEntryResponse::from_entry(role, entry))
        .collect();

    Ok(Json(entries))
}

pub async fn list_custom_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<CustomRoleResponse>>> {
    let context = state.access_guard.authenticate(Some(&user)).await?;

    let roles = state
        .custom_role_service
        .list_roles(&context)
        .await?
        .into_iter()
        .map(CustomRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateCustomRoleRequest>,
) -> ApiResult<(StatusCode, Json<CustomRoleResponse>)> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanManageRoles)
        .await?;

    let role = state
        .custom_role_service
        .create_role(
            &context,
            CreateCustomRoleInput {
                name: payload.name,
                level: payload.level,
                permissions: permission_set_from_request(&payload.permissions)?,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CustomRoleResponse::from(role))))
}

pub async fn update_custom_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateCustomRolePermissionsRequest>,
) -> ApiResult<Json<CustomRoleResponse>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanManageRoles)
        .await?;

    let role = state
        .custom_role_service
        .update_role_permissions(
            &context,
            CustomRoleId::parse(role_id.as_str())?,
            UpdateCustomRolePermissionsInput {
                permissions: permission_set_from_request(&payload.permissions)?,
                expected_version: payload.expected_version,
            },
        )
        .await?;

    Ok(Json(CustomRoleResponse::from(role)))
}

pub async fn deactivate_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<DeactivateCustomRoleRequest>,
) -> ApiResult<Json<RoleDeactivationResponse>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanManageRoles)
        .await?;

    let reassign_to = payload
        .reassign_to
        .as_deref()
        .map(RoleReference::parse)
        .transpose()?;

    let deactivation = state
        .custom_role_service
        .deactivate_role(
            &context,
            CustomRoleId::parse(role_id.as_str())?,
            reassign_to,
        )
        .await?;

    Ok(Json(RoleDeactivationResponse::from(deactivation)))
}

fn permission_set_from_request(
    flags: &std::collections::BTreeMap<String, bool>,
) -> AppResult<PermissionSet> {
    PermissionSet::from_flags(
        flags
            .iter()
            .map(|(capability, allowed)| (capability.as_str(), *allowed)),
    )
}
