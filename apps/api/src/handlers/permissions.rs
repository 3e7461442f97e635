use axum::Json;
use axum::extract::{Extension, Path, State};
use fieldcrew_core::UserIdentity;

use crate::dto::PermissionCheckResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Answers whether the caller currently holds one capability.
///
/// Unknown capability names are rejected rather than reported as denied.
pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(capability): Path<String>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let allowed = state
        .access_guard
        .resolver()
        .has_capability_named(user.tenant_id(), user.subject(), capability.as_str())
        .await?;

    Ok(Json(PermissionCheckResponse {
        capability,
        allowed,
    }))
}
