//! Infrastructure adapters for access-control ports.

#![forbid(unsafe_code)]

mod in_memory_access_store;
mod postgres_access_control_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod role_catalog_loader;

pub use in_memory_access_store::InMemoryAccessStore;
pub use postgres_access_control_repository::PostgresAccessControlRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use role_catalog_loader::{load_role_catalog, parse_role_catalog};
