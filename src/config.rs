//! Benchmark profile: endpoints, browser and logging settings.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder replaced by the service ticket in [`AppConfig::login_url`].
pub const TICKET_PLACEHOLDER: &str = "{ticket}";

fn default_name() -> String {
    "apu".to_string()
}

fn default_tickets_url() -> String {
    "https://den.apu.edu/cas/v1/tickets".to_string()
}

fn default_service_url() -> String {
    "https://home.apu.edu/app/profile/logintoapp".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_login_url() -> String {
    "https://home.apu.edu/app/profile/logintoapp?ticket={ticket}".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_browser_log() -> PathBuf {
    PathBuf::from("cas_auth_browser.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub cas: CasConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasConfig {
    #[serde(default = "default_tickets_url")]
    pub tickets_url: String,
    /// Value of the `service` parameter sent with the service-ticket request.
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default)]
    pub credential_encoding: CredentialEncoding,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default = "default_browser_log")]
    pub log_path: PathBuf,
    #[serde(default)]
    pub session: SessionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// How the username and password are written into the TGT request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CredentialEncoding {
    /// `username=<u>&password=<p>` with no escaping at all.
    #[default]
    Raw,
    /// Proper `application/x-www-form-urlencoded` escaping.
    Form,
}

/// Whether iterations share cookies and session state in the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// One tab reused by every iteration.
    #[default]
    Shared,
    /// A new isolated browser context per navigation.
    Fresh,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Shared => "shared",
            SessionMode::Fresh => "fresh",
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: default_name(),
            cas: CasConfig::default(),
            app: AppConfig::default(),
            browser: BrowserConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            tickets_url: default_tickets_url(),
            service_url: default_service_url(),
            credential_encoding: CredentialEncoding::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            sandbox: false,
            log_path: default_browser_log(),
            session: SessionMode::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("app.login_url must contain the {{ticket}} placeholder")]
    MissingTicketPlaceholder,
    #[error("cas.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl Profile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_url("cas.tickets_url", &self.cas.tickets_url)?;
        check_url("cas.service_url", &self.cas.service_url)?;

        if !self.app.login_url.contains(TICKET_PLACEHOLDER) {
            return Err(ProfileError::MissingTicketPlaceholder);
        }
        check_url(
            "app.login_url",
            &self.app.login_url.replace(TICKET_PLACEHOLDER, "ST-0"),
        )?;

        if self.cas.timeout_secs == 0 {
            return Err(ProfileError::ZeroTimeout);
        }
        Ok(())
    }

    /// Builds the application login URL for one service ticket.
    pub fn login_url(&self, ticket: &str) -> String {
        self.app.login_url.replace(TICKET_PLACEHOLDER, ticket)
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ProfileError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|_| ProfileError::InvalidUrl {
            field,
            value: value.to_string(),
        })
}

pub struct ProfileLoader {
    base_dir: PathBuf,
}

impl ProfileLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Profile> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read profile file {}", path.display()))?;
        let profile: Profile = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        profile
            .validate()
            .with_context(|| format!("Invalid profile {}", path.display()))?;
        Ok(profile)
    }
}
