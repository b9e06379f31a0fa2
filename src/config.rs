//! Configuration and settings management
//!
//! Loads settings from environment variables (optionally seeded from a
//! `.env` file and `config/` overrides). The resulting [`Settings`] value is
//! passed explicitly to every component at construction; nothing reads
//! configuration ambiently after startup.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// How poll cycles behave when one overruns the poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Run each cycle inline. An overrunning cycle delays later ticks; at
    /// most one tick is ever pending, so cycles never stack.
    Serialize,
    /// Spawn each cycle as its own task. A slow provider yields concurrent
    /// cycles, which may duplicate notifications.
    Overlap,
}

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Chat id of the group that receives OTP notifications
    pub telegram_group_id: i64,

    /// Root URL of the SMS-provisioning API
    pub sms_api_base_url: String,

    /// Bearer token for SMS-provisioning API requests
    pub sms_api_key: String,

    /// Poll period in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// `overlap` to let slow cycles run concurrently; anything else serializes
    #[serde(rename = "poll_mode")]
    pub poll_mode_str: Option<String>,

    /// Timeout for provider HTTP requests in seconds
    #[serde(default = "default_sms_http_timeout_secs")]
    pub sms_http_timeout_secs: u64,
}

const fn default_poll_interval_secs() -> u64 {
    30
}

const fn default_sms_http_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Poll period for the OTP poller.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Timeout applied to every provider HTTP request.
    #[must_use]
    pub const fn sms_http_timeout(&self) -> Duration {
        Duration::from_secs(self.sms_http_timeout_secs)
    }

    /// Overlap policy for the OTP poller. Unrecognized values serialize.
    #[must_use]
    pub fn poll_mode(&self) -> PollMode {
        match self.poll_mode_str.as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("overlap") => PollMode::Overlap,
            _ => PollMode::Serialize,
        }
    }
}
