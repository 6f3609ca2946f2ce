use std::fmt;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::errors::WatchError;

pub const DEFAULT_STATUS_PAGE_URL: &str = "https://freetrial.finalfantasyxiv.com/";
pub const DEFAULT_UNAVAILABLE_TEXT: &str = "FREE TRIAL TEMPORARILY UNAVAILABLE";

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    /// Page whose status heading is polled.
    pub status_page_url: String,

    /// Heading text meaning "still unavailable". Anything else fires the broadcast.
    pub unavailable_text: String,

    pub poll_interval_secs: u64,

    /// Timeout applied to every outbound request (status page and mail API).
    pub fetch_timeout_secs: u64,

    pub mail_jet_public_key: String,
    pub mail_jet_private_key: String,

    /// Base URL of the Mailjet API, without the `/v3.1/send` suffix.
    pub mail_jet_api_url: String,

    pub mail_from_email: String,
    pub mail_from_name: String,

    /// Comma-separated addresses added to the registry at startup.
    #[serde(default)]
    pub initial_subscribers: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, WatchError> {
        Self::load(Environment::default())
    }

    pub(crate) fn load(env: Environment) -> Result<Self, WatchError> {
        let cfg = Config::builder()
            .set_default("port", 8000_i64)?
            .set_default("log_level", "info")?
            .set_default("status_page_url", DEFAULT_STATUS_PAGE_URL)?
            .set_default("unavailable_text", DEFAULT_UNAVAILABLE_TEXT)?
            .set_default("poll_interval_secs", 3600_i64)?
            .set_default("fetch_timeout_secs", 30_i64)?
            .set_default("mail_jet_api_url", "https://api.mailjet.com")?
            .set_default("mail_from_email", "trialwatch@example.com")?
            .set_default("mail_from_name", "Trial Watch")?
            .add_source(env)
            .build()?
            .try_deserialize::<AppConfig>()?;

        if cfg.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(cfg)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn initial_subscribers(&self) -> Vec<String> {
        self.initial_subscribers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// Hand-written so the private key never ends up in the startup log.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("status_page_url", &self.status_page_url)
            .field("unavailable_text", &self.unavailable_text)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("mail_jet_public_key", &self.mail_jet_public_key)
            .field("mail_jet_private_key", &"<redacted>")
            .field("mail_jet_api_url", &self.mail_jet_api_url)
            .field("mail_from_email", &self.mail_from_email)
            .field("mail_from_name", &self.mail_from_name)
            .field("initial_subscribers", &self.initial_subscribers())
            .finish()
    }
}
