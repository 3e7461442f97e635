use std::path::Path;

use fieldcrew_core::{AppError, AppResult};
use fieldcrew_domain::{RoleCatalog, RoleCatalogDocument};
use tracing::info;

/// Loads the built-in role catalog.
///
/// Without a path the compiled-in standard catalog is used. A file must hold a
/// complete JSON catalog document; it is validated before any request is served.
pub async fn load_role_catalog(path: Option<&Path>) -> AppResult<RoleCatalog> {
    let Some(path) = path else {
        info!("using standard role catalog");
        return Ok(RoleCatalog::standard());
    };

    let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to read role catalog '{}': {error}",
            path.display()
        ))
    })?;

    let catalog = parse_role_catalog(raw.as_str())?;
    info!(
        path = %path.display(),
        version = catalog.version(),
        "loaded role catalog"
    );
    Ok(catalog)
}

/// Parses and validates a JSON catalog document.
pub fn parse_role_catalog(raw: &str) -> AppResult<RoleCatalog> {
    let document: RoleCatalogDocument = serde_json::from_str(raw)
        .map_err(|error| AppError::Validation(format!("invalid role catalog document: {error}")))?;

    RoleCatalog::from_document(document)
}
