use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use fieldcrew_application::AuditLogQuery;
use fieldcrew_core::UserIdentity;
use fieldcrew_domain::{AuditAction, Capability};
use serde::Deserialize;

use crate::dto::AuditLogEntryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_AUDIT_PAGE_SIZE: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub actor: Option<String>,
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogListQuery>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let context = state
        .access_guard
        .require_permission(Some(&user), Capability::CanViewAuditLog)
        .await?;

    let action = query
        .action
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(AuditAction::from_str)
        .transpose()?;

    let entries = state
        .audit_trail
        .list(
            &context,
            AuditLogQuery {
                limit: query.limit.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE),
                offset: query.offset.unwrap_or(0),
                action,
                actor: query.actor.filter(|value| !value.trim().is_empty()),
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
