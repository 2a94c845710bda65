//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_INVITE_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS, DOCUMENTS_ROWS_PER_PAGE,
    NO_TEAM_ID,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Runtime configuration for Mergeflow clients.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub team_id: Option<String>,
    pub user_email: Option<String>,
    pub user_type: String,
    pub rows_per_page: usize,
    pub request_timeout_ms: u64,
    pub invite_base_url: String,
    pub revalidate_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            team_id: None,
            user_email: None,
            user_type: "member".to_string(),
            rows_per_page: DOCUMENTS_ROWS_PER_PAGE,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            invite_base_url: DEFAULT_INVITE_BASE_URL.to_string(),
            revalidate_on_failure: true,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = non_blank_var(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'", name, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: non_blank_var("MERGEFLOW_API_URL").unwrap_or(defaults.api_base_url),
            team_id: non_blank_var("MERGEFLOW_TEAM_ID"),
            user_email: non_blank_var("MERGEFLOW_USER_EMAIL"),
            user_type: non_blank_var("MERGEFLOW_USER_TYPE").unwrap_or(defaults.user_type),
            rows_per_page: parsed_var::<usize>("MERGEFLOW_ROWS_PER_PAGE")
                .filter(|rows| *rows > 0)
                .unwrap_or(defaults.rows_per_page),
            request_timeout_ms: parsed_var("MERGEFLOW_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            invite_base_url: non_blank_var("MERGEFLOW_INVITE_BASE_URL")
                .unwrap_or(defaults.invite_base_url),
            revalidate_on_failure: non_blank_var("MERGEFLOW_REVALIDATE_ON_FAILURE")
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(defaults.revalidate_on_failure),
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Team id usable for scoped requests, or `None` for the "no team" placeholder.
    pub fn team_scope(&self) -> Option<&str> {
        self.team_id
            .as_deref()
            .filter(|team| !team.is_empty() && *team != NO_TEAM_ID)
    }
}
