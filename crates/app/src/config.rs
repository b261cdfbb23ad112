//! Environment-driven configuration.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `FACTORDESK_DATA_DIR` | directory holding `local.db` | platform data dir + `factordesk` |
//! | `FACTORDESK_SESSION_MAX_AGE_HOURS` | forced-logout age | `2` |
//! | `FACTORDESK_REMOTE_URL` | hosted auth/database base URL | unset |
//! | `FACTORDESK_REMOTE_ANON_KEY` | public API key for the above | unset |
//! | `FACTORDESK_UNRESTRICTED_ATTACHMENTS` | accept any file type | `false` |
//! | `FACTORDESK_MAX_ATTACHMENT_BYTES` | per-file size limit, `0` for none | 5 MiB |
//! | `FACTORDESK_LOG_FORMAT` | `json` or `pretty` | `json` |

use std::path::PathBuf;
use std::str::FromStr;

use factordesk_auth::DEFAULT_MAX_AGE_HOURS;
use factordesk_invoicing::AttachmentPolicy;
use factordesk_observability::{LogConfig, LogFormat};
use thiserror::Error;

pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const DATA_DIR: &str = "FACTORDESK_DATA_DIR";
const SESSION_MAX_AGE_HOURS: &str = "FACTORDESK_SESSION_MAX_AGE_HOURS";
const REMOTE_URL: &str = "FACTORDESK_REMOTE_URL";
const REMOTE_ANON_KEY: &str = "FACTORDESK_REMOTE_ANON_KEY";
const UNRESTRICTED_ATTACHMENTS: &str = "FACTORDESK_UNRESTRICTED_ATTACHMENTS";
const MAX_ATTACHMENT_BYTES: &str = "FACTORDESK_MAX_ATTACHMENT_BYTES";
const LOG_FORMAT: &str = "FACTORDESK_LOG_FORMAT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("FACTORDESK_REMOTE_URL and FACTORDESK_REMOTE_ANON_KEY must be set together")]
    IncompleteRemote,

    #[error("no data directory, set FACTORDESK_DATA_DIR: {0}")]
    NoDataDir(String),
}

/// Hosted auth/database endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub session_max_age_hours: u32,
    pub remote: Option<RemoteConfig>,
    pub unrestricted_attachments: bool,
    /// `None` disables the size limit.
    pub max_attachment_bytes: Option<usize>,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            session_max_age_hours: DEFAULT_MAX_AGE_HOURS,
            remote: None,
            unrestricted_attachments: false,
            max_attachment_bytes: Some(DEFAULT_MAX_ATTACHMENT_BYTES),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DATA_DIR) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = get(SESSION_MAX_AGE_HOURS) {
            let hours: u32 = parse(SESSION_MAX_AGE_HOURS, &raw)?;
            if hours == 0 {
                return Err(invalid(SESSION_MAX_AGE_HOURS, &raw, "must be at least 1"));
            }
            config.session_max_age_hours = hours;
        }

        config.remote = match (get(REMOTE_URL), get(REMOTE_ANON_KEY)) {
            (Some(url), Some(anon_key)) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(invalid(REMOTE_URL, &url, "must be an http(s) URL"));
                }
                Some(RemoteConfig { url, anon_key })
            }
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteRemote),
        };

        if let Some(raw) = get(UNRESTRICTED_ATTACHMENTS) {
            config.unrestricted_attachments = parse_flag(UNRESTRICTED_ATTACHMENTS, &raw)?;
        }

        if let Some(raw) = get(MAX_ATTACHMENT_BYTES) {
            let bytes: usize = parse(MAX_ATTACHMENT_BYTES, &raw)?;
            config.max_attachment_bytes = (bytes > 0).then_some(bytes);
        }

        if let Some(raw) = get(LOG_FORMAT) {
            config.log.format = raw
                .parse::<LogFormat>()
                .map_err(|e| invalid(LOG_FORMAT, &raw, &e.to_string()))?;
        }

        Ok(config)
    }

    /// Storage file location.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.join("local.db")),
            None => factordesk_storage::default_db_path()
                .map_err(|e| ConfigError::NoDataDir(format!("{e:#}"))),
        }
    }

    /// Install the global log subscriber described by this config.
    pub fn init_logging(&self) -> bool {
        factordesk_observability::init(&self.log)
    }

    pub fn attachment_policy(&self) -> AttachmentPolicy {
        let policy = if self.unrestricted_attachments {
            AttachmentPolicy::unrestricted()
        } else {
            AttachmentPolicy::pdf_only()
        };
        match self.max_attachment_bytes {
            Some(max) => policy.with_max_bytes(max),
            None => policy,
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(key, raw, &e.to_string()))
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected true or false")),
    }
}
