mod bootstrap;
mod session;
mod session_helpers;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler};
pub(crate) use session_helpers::{establish_session, read_session_identity};

pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
