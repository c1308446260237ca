//! Client configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use stocklog_observability::LogFormat;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const API_URL: &str = "STOCKLOG_API_URL";
const REQUEST_TIMEOUT_MS: &str = "STOCKLOG_REQUEST_TIMEOUT_MS";
const SUCCESS_NOTICE_MS: &str = "STOCKLOG_SUCCESS_NOTICE_MS";
const ERROR_NOTICE_MS: &str = "STOCKLOG_ERROR_NOTICE_MS";
const SESSION_FILE: &str = "STOCKLOG_SESSION_FILE";
const LOG_FORMAT: &str = "STOCKLOG_LOG_FORMAT";

/// How long each kind of notice stays visible.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NoticeTimings {
    pub success: Duration,
    pub error: Duration,
}

impl Default for NoticeTimings {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(1500),
            error: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the inventory service, without a trailing `/`.
    pub api_url: String,
    pub request_timeout: Duration,
    pub notices: NoticeTimings,
    /// Where the session token is kept between runs.
    pub session_file: PathBuf,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} cannot be empty")]
    Empty { var: &'static str },
    #[error("{var} must be a positive number of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
    #[error("invalid {var}: {source}")]
    LogFormat {
        var: &'static str,
        source: stocklog_observability::UnknownLogFormat,
    },
    #[error("no data directory found for the session file; set STOCKLOG_SESSION_FILE")]
    NoDataDir,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup(API_URL) {
            Some(url) => normalize_api_url(&url).ok_or(ConfigError::Empty { var: API_URL })?,
            None => DEFAULT_API_URL.to_string(),
        };

        let request_timeout = duration_ms(&lookup, REQUEST_TIMEOUT_MS, 10_000)?;
        let defaults = NoticeTimings::default();
        let notices = NoticeTimings {
            success: duration_ms(&lookup, SUCCESS_NOTICE_MS, defaults.success.as_millis() as u64)?,
            error: duration_ms(&lookup, ERROR_NOTICE_MS, defaults.error.as_millis() as u64)?,
        };

        let session_file = match lookup(SESSION_FILE) {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Empty { var: SESSION_FILE });
            }
            Some(path) => PathBuf::from(path),
            None => default_session_file().ok_or(ConfigError::NoDataDir)?,
        };

        let log_format = match lookup(LOG_FORMAT) {
            Some(raw) => raw
                .parse()
                .map_err(|source| ConfigError::LogFormat { var: LOG_FORMAT, source })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api_url,
            request_timeout,
            notices,
            session_file,
            log_format,
        })
    }

    /// Replace the API URL (e.g. from a command-line flag).
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(url).ok_or(ConfigError::Empty { var: API_URL })?;
        Ok(self)
    }
}

fn normalize_api_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn duration_ms<F>(lookup: &F, var: &'static str, default_ms: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(Duration::from_millis(default_ms));
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidDuration { var, value: raw }),
    }
}

fn default_session_file() -> Option<PathBuf> {
    let mut dir = dirs::data_dir().or_else(|| {
        dirs::home_dir().map(|mut h| {
            h.push(".local");
            h.push("share");
            h
        })
    })?;
    dir.push("stocklog");
    dir.push("session.json");
    Some(dir)
}
