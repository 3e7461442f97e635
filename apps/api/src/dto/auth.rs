use serde::Deserialize;
use ts_rs::TS;

/// Incoming payload for a bootstrap session.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub subject: String,
    pub token: String,
    /// Existing tenant to join; a fresh tenant is created when absent.
    pub tenant_id: Option<String>,
}
