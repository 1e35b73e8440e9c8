//! Device settings.
//!
//! Keys match the variable names used on the device:
//!
//! ```yaml
//! REQUEST_URL: "http://192.168.1.10:8000/display"
//! REQUEST_HEADER_USER_AGENT: "pollpanel/0.1"
//! REQUEST_HEADER_AUTHORIZATION: "Bearer secret-token"
//! POLLING_TIME_SECONDS: 60
//! DEEP_SLEEP_SECONDS: 0      # optional, 0 or absent disables deep sleep
//! DISPLAY_DEVICE: "SSD1306"  # or "EPAPER213"
//! WIFI_SSID: "home"
//! WIFI_PASSWORD: "hunter2"
//! COUNTRY: "JP"
//! ```
//!
//! Settings are validated on load, so an unknown display name fails before
//! any network bring-up.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pollpanel::Settings;
//!
//! let settings = Settings::load("settings.yaml")?;
//! // or
//! let settings = Settings::from_env()?;
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::display::DisplayKind;
use crate::error::Error;
use crate::wifi::WifiCredentials;
use crate::{DEFAULT_COUNTRY, DEFAULT_POLLING_TIME_SECONDS, DEFAULT_USER_AGENT};

/// Runtime settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    /// URL polled every cycle
    pub request_url: String,

    /// `User-Agent` header value
    #[serde(default = "default_user_agent")]
    pub request_header_user_agent: String,

    /// `Authorization` header value, e.g. `Bearer <token>`
    #[serde(default)]
    pub request_header_authorization: String,

    /// Pause between cycles (default: 60)
    #[serde(default = "default_polling_time")]
    pub polling_time_seconds: u64,

    /// Deep sleep after one cycle instead of pausing
    #[serde(default)]
    pub deep_sleep_seconds: Option<u64>,

    /// Display variant name, case-insensitive
    #[serde(default = "default_display_device")]
    pub display_device: String,

    /// Network name
    #[serde(default)]
    pub wifi_ssid: String,

    /// Network password
    #[serde(default)]
    pub wifi_password: String,

    /// Regulatory domain code
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_polling_time() -> u64 {
    DEFAULT_POLLING_TIME_SECONDS
}

fn default_display_device() -> String {
    DisplayKind::Ssd1306.name().to_string()
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Settings {
    /// Settings polling `request_url`, everything else defaulted.
    pub fn new(request_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            request_header_user_agent: default_user_agent(),
            request_header_authorization: String::new(),
            polling_time_seconds: DEFAULT_POLLING_TIME_SECONDS,
            deep_sleep_seconds: None,
            display_device: default_display_device(),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            country: default_country(),
        }
    }

    /// Load and validate settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read settings file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from environment variables named like the YAML keys.
    ///
    /// `REQUEST_URL` is required; the rest fall back to defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request_url = lookup("REQUEST_URL")
            .ok_or_else(|| Error::Config("REQUEST_URL is not set".to_string()))?;
        let mut settings = Self::new(request_url);

        if let Some(value) = lookup("REQUEST_HEADER_USER_AGENT") {
            settings.request_header_user_agent = value;
        }
        if let Some(value) = lookup("REQUEST_HEADER_AUTHORIZATION") {
            settings.request_header_authorization = value;
        }
        if let Some(value) = lookup("POLLING_TIME_SECONDS") {
            settings.polling_time_seconds = parse_seconds("POLLING_TIME_SECONDS", &value)?;
        }
        if let Some(value) = lookup("DEEP_SLEEP_SECONDS") {
            settings.deep_sleep_seconds = Some(parse_seconds("DEEP_SLEEP_SECONDS", &value)?);
        }
        if let Some(value) = lookup("DISPLAY_DEVICE") {
            settings.display_device = value;
        }
        if let Some(value) = lookup("WIFI_SSID") {
            settings.wifi_ssid = value;
        }
        if let Some(value) = lookup("WIFI_PASSWORD") {
            settings.wifi_password = value;
        }
        if let Some(value) = lookup("COUNTRY") {
            settings.country = value;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check everything that can be checked before bring-up.
    pub fn validate(&self) -> Result<(), Error> {
        if self.request_url.trim().is_empty() {
            return Err(Error::Config("REQUEST_URL is empty".to_string()));
        }
        if self.polling_time_seconds == 0 && self.deep_sleep().is_none() {
            return Err(Error::Config(
                "POLLING_TIME_SECONDS must be greater than zero".to_string(),
            ));
        }
        self.display_kind()?;
        Ok(())
    }

    /// Display variant selected by `DISPLAY_DEVICE`.
    pub fn display_kind(&self) -> Result<DisplayKind, Error> {
        DisplayKind::from_name(&self.display_device)
    }

    /// Pause between cycles.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_time_seconds)
    }

    /// Deep sleep duration; `None` when unset or zero.
    pub fn deep_sleep(&self) -> Option<Duration> {
        self.deep_sleep_seconds
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Credentials for Wi-Fi bring-up.
    pub fn wifi_credentials(&self) -> WifiCredentials {
        WifiCredentials::new(&self.wifi_ssid, &self.wifi_password, &self.country)
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.request_header_user_agent = user_agent.into();
        self
    }

    /// Set the `Authorization` header value.
    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.request_header_authorization = authorization.into();
        self
    }

    /// Set the pause between cycles.
    #[must_use]
    pub fn with_polling_time(mut self, seconds: u64) -> Self {
        self.polling_time_seconds = seconds;
        self
    }

    /// Enable deep sleep after each cycle.
    #[must_use]
    pub fn with_deep_sleep(mut self, seconds: u64) -> Self {
        self.deep_sleep_seconds = Some(seconds);
        self
    }

    /// Select the display variant by name.
    #[must_use]
    pub fn with_display_device(mut self, name: impl Into<String>) -> Self {
        self.display_device = name.into();
        self
    }

    /// Set Wi-Fi credentials and regulatory domain.
    #[must_use]
    pub fn with_wifi(
        mut self,
        ssid: impl Into<String>,
        password: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.wifi_ssid = ssid.into();
        self.wifi_password = password.into();
        self.country = country.into();
        self
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{} must be a number of seconds: {}", key, e)))
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("request_url", &self.request_url)
            .field("request_header_user_agent", &self.request_header_user_agent)
            .field("request_header_authorization", &"<redacted>")
            .field("polling_time_seconds", &self.polling_time_seconds)
            .field("deep_sleep_seconds", &self.deep_sleep_seconds)
            .field("display_device", &self.display_device)
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_password", &"<redacted>")
            .field("country", &self.country)
            .finish()
    }
}
