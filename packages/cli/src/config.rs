// ABOUTME: Server configuration loaded from the environment
// ABOUTME: Ports, database path, CORS origin, outbound timeouts, and provider credentials

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use revv_config::*;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid HTTP timeout '{0}'; expected a whole number of seconds greater than zero")]
    InvalidTimeout(String),
    #[error("{service} is partially configured; missing {missing}")]
    Incomplete {
        service: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
    pub api_key: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub api_key: String,
    pub api_url: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub cors_origin: String,
    pub http_timeout: Duration,
    /// `None` puts tracking in manual-link mode
    pub tracking: Option<TrackingConfig>,
    pub sms: Option<SmsConfig>,
    pub email: Option<EmailConfig>,
    pub shop_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any name-to-value lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get(REVV_API_PORT).or_else(|| get(PORT)) {
            Some(raw) => {
                let port = raw
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
                if port == 0 {
                    return Err(ConfigError::PortOutOfRange(port));
                }
                port
            }
            None => DEFAULT_API_PORT,
        };

        let http_timeout = match get(REVV_HTTP_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let database_path = get(REVV_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| revv_core::revv_dir().join("revv.db"));

        let tracking = get(REVV_TRACKING_API_KEY).map(|api_key| TrackingConfig {
            api_key,
            api_url: get(REVV_TRACKING_API_URL)
                .unwrap_or_else(|| DEFAULT_TRACKING_API_URL.to_string()),
        });

        let sms = match (
            get(TWILIO_ACCOUNT_SID),
            get(TWILIO_AUTH_TOKEN),
            get(TWILIO_FROM_NUMBER),
        ) {
            (None, None, None) => None,
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(SmsConfig {
                account_sid,
                auth_token,
                from_number,
                api_url: get(TWILIO_API_URL).unwrap_or_else(|| DEFAULT_TWILIO_API_URL.to_string()),
            }),
            (sid, token, _) => {
                let missing = if sid.is_none() {
                    TWILIO_ACCOUNT_SID
                } else if token.is_none() {
                    TWILIO_AUTH_TOKEN
                } else {
                    TWILIO_FROM_NUMBER
                };
                return Err(ConfigError::Incomplete {
                    service: "Twilio SMS",
                    missing,
                });
            }
        };

        let email = match get(REVV_EMAIL_API_KEY) {
            None => None,
            Some(api_key) => {
                let from_address = get(REVV_EMAIL_FROM).ok_or(ConfigError::Incomplete {
                    service: "Email",
                    missing: REVV_EMAIL_FROM,
                })?;
                Some(EmailConfig {
                    api_key,
                    api_url: get(REVV_EMAIL_API_URL)
                        .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
                    from_address,
                })
            }
        };

        Ok(Config {
            host: get(REVV_API_HOST).unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            port,
            database_path,
            cors_origin: get(REVV_CORS_ORIGIN).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            http_timeout,
            tracking,
            sms,
            email,
            shop_name: get(REVV_SHOP_NAME).unwrap_or_else(|| DEFAULT_SHOP_NAME.to_string()),
        })
    }
}
