mod database;
mod invitation_sweep;
mod sessions;
mod state_builder;

pub use database::connect_and_migrate;
pub use invitation_sweep::spawn_invitation_sweep;
pub use sessions::build_postgres_session_layer;
pub use state_builder::build_app_state;
#[cfg(test)]
pub(crate) use state_builder::{AccessRepositories, AccessServices, build_access_services};
