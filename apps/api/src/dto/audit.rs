use fieldcrew_application::AuditLogEntry;
use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub actor: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub before: Option<Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub after: Option<Value>,
    pub occurred_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            actor: value.actor,
            action: value.action.as_str().to_owned(),
            target_type: value.target_type,
            target_id: value.target_id,
            before: value.before,
            after: value.after,
            occurred_at: value.occurred_at.to_rfc3339(),
        }
    }
}
