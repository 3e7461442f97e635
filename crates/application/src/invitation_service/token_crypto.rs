use std::fmt::Write;

use fieldcrew_core::{AppError, AppResult, TenantId};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const TOKEN_SECRET_BYTES: usize = 32;

/// Raw invitation token and the digest stored in place of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct IssuedToken {
    pub(super) raw: String,
    pub(super) hash: String,
}

/// Generates `<tenant>.<secret>`, where the secret is 32 random bytes in hex.
///
/// The tenant prefix lets acceptance scope its lookup before the token is
/// matched; only the digest of the full string is persisted.
pub(super) fn generate_token(tenant_id: TenantId) -> AppResult<IssuedToken> {
    let mut bytes = [0u8; TOKEN_SECRET_BYTES];
    getrandom::fill(&mut bytes).map_err(|error| {
        AppError::Internal(format!("failed to generate invitation token: {error}"))
    })?;

    let raw = format!("{}.{}", tenant_id.as_uuid().simple(), to_hex(&bytes));
    let hash = hash_token(&raw);
    Ok(IssuedToken { raw, hash })
}

/// SHA-256 hex digest of a raw token.
pub(super) fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.trim().as_bytes());
    to_hex(&hasher.finalize())
}

/// Extracts the tenant prefix. Malformed tokens are indistinguishable from
/// unknown ones.
pub(super) fn token_tenant(raw_token: &str) -> AppResult<TenantId> {
    let unrecognized = || AppError::Unauthenticated("invitation token is not recognized".to_owned());

    let (tenant, secret) = raw_token.trim().split_once('.').ok_or_else(unrecognized)?;
    if secret.len() != TOKEN_SECRET_BYTES * 2 || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(unrecognized());
    }

    Uuid::parse_str(tenant)
        .map(TenantId::from_uuid)
        .map_err(|_| unrecognized())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
