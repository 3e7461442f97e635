use axum::Json;
use axum::extract::{Extension, Path, State};
use fieldcrew_core::UserIdentity;
use fieldcrew_domain::{Capability, RoleReference};

use crate::dto::{AssignRoleRequest, RoleAssignmentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanManageUsers)
        .await?;

    let assignments = state
        .team_service
        .list_assignments(&context)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(subject): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanManageUsers)
        .await?;

    let assignment = state
        .team_service
        .assign_role(
            &context,
            subject.as_str(),
            RoleReference::parse(payload.role.as_str())?,
        )
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}
