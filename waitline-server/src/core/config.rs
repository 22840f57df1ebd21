use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};
use crate::queue::estimator::DEFAULT_SAMPLE_WINDOW;

/// Server configuration
///
/// All values can be overridden by environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/waitline | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | SMS_GATEWAY_URL | (unset) | Messaging gateway base URL; unset disables sending |
/// | NOTIFY_TIMEOUT_MS | 5000 | Per-message provider timeout |
/// | DAILY_MESSAGE_QUOTA | (unset) | Per-business daily message cap; unset means unmetered |
/// | ESTIMATOR_WINDOW | 20 | Seated entries sampled for the wait estimate |
/// | JWT_SECRET | (unset) | Operator token signing secret |
/// | JWT_EXPIRATION_MINUTES | 1440 | Operator token lifetime |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    pub http_port: u16,
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,

    /// Messaging gateway base URL; `None` disables outbound messages
    pub sms_gateway_url: Option<String>,
    /// Per-message provider round-trip timeout (milliseconds)
    pub notify_timeout_ms: u64,
    /// Per-business daily outbound message cap
    pub daily_message_quota: Option<u64>,
    /// How many recently seated entries feed the wait estimate
    pub estimator_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/waitline".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            sms_gateway_url: std::env::var("SMS_GATEWAY_URL").ok().filter(|s| !s.is_empty()),
            notify_timeout_ms: std::env::var("NOTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            daily_message_quota: std::env::var("DAILY_MESSAGE_QUOTA")
                .ok()
                .and_then(|p| p.parse().ok()),
            estimator_window: std::env::var("ESTIMATOR_WINDOW")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SAMPLE_WINDOW),
        })
    }

    /// Override the fields tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Result<Self> {
        let mut config = Self::from_env()?;
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
