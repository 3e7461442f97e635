use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::TimeDelta;
use fieldcrew_application::DEFAULT_INVITATION_TTL_HOURS;
use fieldcrew_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_INVITATION_SWEEP_SECONDS: u64 = 300;
const MAX_INVITATION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub _session_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub role_catalog_path: Option<PathBuf>,
    pub invitation_ttl: TimeDelta,
    pub invitation_sweep_seconds: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let role_catalog_path = env::var("ROLE_CATALOG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let invitation_ttl_hours = optional_positive_env(
            "INVITATION_TTL_HOURS",
            DEFAULT_INVITATION_TTL_HOURS.unsigned_abs(),
        )?;
        let invitation_ttl = invitation_ttl_from_hours(invitation_ttl_hours)?;
        let invitation_sweep_seconds =
            optional_positive_env("INVITATION_SWEEP_SECONDS", DEFAULT_INVITATION_SWEEP_SECONDS)?;

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            _session_secret: session_secret,
            api_host,
            api_port,
            cookie_secure,
            role_catalog_path,
            invitation_ttl,
            invitation_sweep_seconds,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn optional_positive_env(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_positive(name, value.as_str()),
        _ => Ok(default),
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u64, AppError> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    if parsed == 0 {
        return Err(AppError::Validation(format!("{name} must be greater than zero")));
    }

    Ok(parsed)
}

fn invitation_ttl_from_hours(hours: u64) -> Result<TimeDelta, AppError> {
    if hours > MAX_INVITATION_TTL_HOURS {
        return Err(AppError::Validation(format!(
            "INVITATION_TTL_HOURS must be at most {MAX_INVITATION_TTL_HOURS}"
        )));
    }

    i64::try_from(hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .ok_or_else(|| AppError::Validation("INVITATION_TTL_HOURS is out of range".to_owned()))
}
