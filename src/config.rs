use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

// --- Environment variables ---

const ENV_API_URL: &str = "MAMANBEBE_API_URL";
const ENV_HISTORY_LIMIT: &str = "MAMANBEBE_HISTORY_LIMIT";
const ENV_HISTORY_REFRESH_MS: &str = "MAMANBEBE_HISTORY_REFRESH_MS";
const ENV_REMINDER_POLL_SECS: &str = "MAMANBEBE_REMINDER_POLL_SECS";
const ENV_WEEK_CHECK_SECS: &str = "MAMANBEBE_WEEK_CHECK_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Success toasts disappear after this long.
pub const SUCCESS_TOAST_TTL: Duration = Duration::from_secs(3);
/// Error toasts stay a little longer.
pub const ERROR_TOAST_TTL: Duration = Duration::from_secs(5);

/// Runtime settings of the client.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Base URL of the backend, without trailing slash.
    pub api_url: String,
    /// How many consultations the history panel shows.
    pub history_limit: u32,
    /// Delay before the history panel is re-read after an exchange.
    pub history_refresh_delay: Duration,
    /// Period of the due-reminder check.
    pub reminder_poll_interval: Duration,
    /// Period of the pregnancy week re-derivation.
    pub week_check_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            history_limit: 10,
            history_refresh_delay: Duration::from_millis(1000),
            reminder_poll_interval: Duration::from_secs(60 * 60),
            week_check_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any key lookup, falling back to defaults
    /// for keys that are absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup(ENV_API_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let history_limit = parse_var(&lookup, ENV_HISTORY_LIMIT)?.unwrap_or(defaults.history_limit);
        if history_limit == 0 {
            anyhow::bail!("{} must be at least 1", ENV_HISTORY_LIMIT);
        }

        let history_refresh_delay = parse_var::<u64, _>(&lookup, ENV_HISTORY_REFRESH_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.history_refresh_delay);
        let reminder_poll_interval = parse_var::<u64, _>(&lookup, ENV_REMINDER_POLL_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.reminder_poll_interval);
        let week_check_interval = parse_var::<u64, _>(&lookup, ENV_WEEK_CHECK_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.week_check_interval);

        if reminder_poll_interval.is_zero() || week_check_interval.is_zero() {
            anyhow::bail!("polling intervals must be greater than zero");
        }

        log::debug!("Loaded configuration, backend at {}", api_url);

        Ok(Self {
            api_url,
            history_limit,
            history_refresh_delay,
            reminder_poll_interval,
            week_check_interval,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .context(format!("Failed to parse environment variable '{}' (value '{}')", name, raw)),
        None => Ok(None),
    }
}
