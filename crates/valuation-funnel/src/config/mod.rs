use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::recovery::{RecoverySchedule, ScheduleError};

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
    pub recovery: RecoveryConfig,
    pub email: EmailConfig,
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

        let schedule = match optional_var("RECOVERY_THRESHOLD_HOURS") {
            Some(raw) => parse_thresholds(&raw)?,
            None => RecoverySchedule::standard(),
        };

        let recovery = RecoveryConfig {
            app_url: optional_var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            cron_secret: env::var("CRON_SECRET").unwrap_or_default(),
            schedule,
            template_id: optional_var("RECOVERY_TEMPLATE_ID"),
        };

        let from_email =
            optional_var("EMAIL_FROM").unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string());
        if !from_email.contains('@') {
            return Err(ConfigError::InvalidSender(from_email));
        }

        let email = EmailConfig {
            sendgrid_api_key: optional_var("SENDGRID_API_KEY"),
            api_base: optional_var("SENDGRID_API_BASE")
                .unwrap_or_else(|| DEFAULT_SENDGRID_BASE.to_string()),
            from_email,
            from_name: optional_var("EMAIL_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
            internal_recipients: optional_var("INTERNAL_RECIPIENTS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        };

        let production = environment == AppEnvironment::Production;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: !production,
                include_targets: !production,
            },
            recovery,
            email,
        })
    }
}

const DEFAULT_APP_URL: &str = "https://fulfill.com/evaluate";
const DEFAULT_FROM_EMAIL: &str = "team@fulfill.com";
const DEFAULT_FROM_NAME: &str = "Fulfill M&A";
const DEFAULT_SENDGRID_BASE: &str = "https://api.sendgrid.com";

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_thresholds(raw: &str) -> Result<RecoverySchedule, ConfigError> {
    let mut hours = Vec::new();
    for entry in split_list(raw) {
        let value = entry
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidThresholdValue(entry.clone()))?;
        hours.push(value);
    }
    RecoverySchedule::new(hours).map_err(|source| ConfigError::InvalidSchedule { source })
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

/// Log filter and formatting switches.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
    pub include_targets: bool,
}

/// Abandonment recovery settings shared by the trigger route and the scheduler.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Base URL of the survey; resume links append `?resume=<id>`.
    pub app_url: String,
    /// Shared secret expected by the trigger endpoint. Empty rejects every call.
    pub cron_secret: String,
    pub schedule: RecoverySchedule,
    /// Provider-side template used instead of the built-in HTML bodies.
    pub template_id: Option<String>,
}

/// Outbound mail provider settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sendgrid_api_key: Option<String>,
    pub api_base: String,
    pub from_email: String,
    pub from_name: String,
    pub internal_recipients: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThresholdValue(String),
    InvalidSchedule { source: ScheduleError },
    InvalidSender(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThresholdValue(value) => write!(
                f,
                "RECOVERY_THRESHOLD_HOURS entry '{}' is not a number",
                value
            ),
            ConfigError::InvalidSchedule { source } => {
                write!(f, "RECOVERY_THRESHOLD_HOURS rejected: {}", source)
            }
            ConfigError::InvalidSender(value) => {
                write!(f, "EMAIL_FROM '{}' is not an email address", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidSchedule { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThresholdValue(_)
            | ConfigError::InvalidSender(_) => None,
        }
    }
}
