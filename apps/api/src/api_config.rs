use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use aegis_core::AppError;
use chrono::TimeDelta;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Signing secret used when `AUTH_SECRET` is unset. Development only.
const DEVELOPMENT_AUTH_SECRET: &str = "aegis-development-secret-change-me";

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// What the binary does after connecting to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    /// Serve the HTTP API.
    Serve,
    /// Apply migrations and exit.
    Migrate,
    /// Apply migrations, seed a development administrator and exit.
    Seed,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub startup_mode: StartupMode,
    pub database_url: String,
    pub frontend_url: String,
    pub frontend_dir: Option<PathBuf>,
    pub api_host: String,
    pub api_port: u16,
    pub auth_secret: String,
    pub session_ttl: TimeDelta,
    pub cookie_secure: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let startup_mode = match env::args().nth(1).as_deref() {
            None => StartupMode::Serve,
            Some("migrate") => StartupMode::Migrate,
            Some("seed") => StartupMode::Seed,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}', expected 'migrate' or 'seed'"
                )));
            }
        };

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let frontend_dir = env::var("FRONTEND_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let auth_secret = match env::var("AUTH_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("AUTH_SECRET is not set, signing sessions with the development secret");
                DEVELOPMENT_AUTH_SECRET.to_owned()
            }
        };

        let session_ttl = parse_session_ttl(env::var("SESSION_TTL_HOURS").ok().as_deref())?;

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            startup_mode,
            database_url,
            frontend_url,
            frontend_dir,
            api_host,
            api_port,
            auth_secret,
            session_ttl,
            cookie_secure,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
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

/// Parses `SESSION_TTL_HOURS`: a whole number of hours, at most one year.
fn parse_session_ttl(value: Option<&str>) -> Result<TimeDelta, AppError> {
    let Some(value) = value else {
        return Ok(TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS));
    };

    let hours = value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}, got '{value}'"
            ))
        })?;

    Ok(TimeDelta::hours(hours))
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value =
        env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
