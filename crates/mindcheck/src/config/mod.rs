use crate::auth::UserId;
use crate::screening::{IncompletePolicy, ScreeningPolicy};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub screening: ScreeningPolicy,
    pub reporting: ReportingConfig,
    pub access: AccessConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let incomplete = match env::var("SCREENING_INCOMPLETE_POLICY") {
            Ok(raw) => IncompletePolicy::parse(&raw)
                .ok_or(ConfigError::InvalidIncompletePolicy { value: raw })?,
            Err(_) => IncompletePolicy::default(),
        };

        let utc_offset = match env::var("REPORT_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw).ok_or(ConfigError::InvalidUtcOffset { value: raw })?,
            Err(_) => utc(),
        };

        let recent_limit = env::var("REPORT_RECENT_LIMIT")
            .unwrap_or_else(|_| DEFAULT_RECENT_LIMIT.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidRecentLimit)?;

        let admins = env::var("APP_ADMIN_USERS")
            .map(|raw| parse_user_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening: ScreeningPolicy { incomplete },
            reporting: ReportingConfig {
                utc_offset,
                recent_limit,
            },
            access: AccessConfig { admins },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Users seeded with the admin role when the service starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    pub admins: Vec<UserId>,
}

fn parse_user_list(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(UserId::new)
        .collect()
}

pub const DEFAULT_RECENT_LIMIT: usize = 7;

/// Dashboard shaping: month truncation offset and table sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingConfig {
    pub utc_offset: FixedOffset,
    pub recent_limit: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            utc_offset: utc(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Accepts `Z`, `UTC`, or a signed `HH:MM` offset such as `+05:30`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }
    trimmed.parse::<FixedOffset>().ok()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIncompletePolicy { value: String },
    InvalidUtcOffset { value: String },
    InvalidRecentLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIncompletePolicy { value } => write!(
                f,
                "SCREENING_INCOMPLETE_POLICY must be 'reject' or 'score_missing_as_zero', got '{}'",
                value
            ),
            ConfigError::InvalidUtcOffset { value } => write!(
                f,
                "REPORT_UTC_OFFSET must look like +05:30 or Z, got '{}'",
                value
            ),
            ConfigError::InvalidRecentLimit => {
                write!(f, "REPORT_RECENT_LIMIT must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("SCREENING_INCOMPLETE_POLICY");
        env::remove_var("REPORT_UTC_OFFSET");
        env::remove_var("REPORT_RECENT_LIMIT");
        env::remove_var("APP_ADMIN_USERS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.screening.incomplete, IncompletePolicy::Reject);
        assert_eq!(config.reporting, ReportingConfig::default());
        assert!(config.access.admins.is_empty());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_screening_and_reporting_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_INCOMPLETE_POLICY", "score_missing_as_zero");
        env::set_var("REPORT_UTC_OFFSET", "+05:30");
        env::set_var("REPORT_RECENT_LIMIT", "10");
        env::set_var("APP_ADMIN_USERS", "admin-1, ,counsellor-2");

        let config = AppConfig::load().expect("config loads");

        assert_eq!(
            config.screening.incomplete,
            IncompletePolicy::ScoreMissingAsZero
        );
        assert_eq!(config.reporting.utc_offset.local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(config.reporting.recent_limit, 10);
        assert_eq!(
            config.access.admins,
            vec![UserId::new("admin-1"), UserId::new("counsellor-2")]
        );
        reset_env();
    }

    #[test]
    fn rejects_unknown_incomplete_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_INCOMPLETE_POLICY", "guess");

        match AppConfig::load() {
            Err(ConfigError::InvalidIncompletePolicy { value }) => assert_eq!(value, "guess"),
            other => panic!("expected policy error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn parses_utc_aliases() {
        assert_eq!(parse_utc_offset("Z"), Some(utc()));
        assert_eq!(parse_utc_offset(" utc "), Some(utc()));
        assert!(parse_utc_offset("somewhere").is_none());
    }
}
