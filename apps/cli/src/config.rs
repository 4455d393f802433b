use std::path::PathBuf;
use std::time::Duration;

use abnamro_bank::BankConfig;
use abnamro_core::{RetryPolicy, SessionConfig};
use abnamro_icscards::IcsConfig;
use anyhow::{anyhow, Context};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Settings read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub bank_base_url: String,
    pub account_number: Option<String>,
    pub cookie_file: Option<PathBuf>,
    pub ics_base_url: String,
    pub ics_username: Option<String>,
    pub ics_password: Option<String>,
    pub request_timeout: Duration,
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| get(key).filter(|value| !value.trim().is_empty());

        let request_timeout = match non_empty("ABNAMRO_REQUEST_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(
                value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid ABNAMRO_REQUEST_TIMEOUT_MS: {}", value))?,
            ),
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };
        let max_attempts = match non_empty("ABNAMRO_MAX_ATTEMPTS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid ABNAMRO_MAX_ATTEMPTS: {}", value))?,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        Ok(Self {
            bank_base_url: non_empty("ABNAMRO_BASE_URL")
                .unwrap_or_else(|| abnamro_bank::DEFAULT_BASE_URL.to_string()),
            account_number: non_empty("ABNAMRO_ACCOUNT_NUMBER"),
            cookie_file: non_empty("ABNAMRO_COOKIE_FILE").map(PathBuf::from),
            ics_base_url: non_empty("ICS_BASE_URL")
                .unwrap_or_else(|| abnamro_icscards::DEFAULT_BASE_URL.to_string()),
            ics_username: non_empty("ICS_USERNAME"),
            ics_password: non_empty("ICS_PASSWORD"),
            request_timeout,
            max_attempts,
        })
    }

    fn session(&self, base_url: &str) -> SessionConfig {
        let retry = RetryPolicy {
            max_attempts: self.max_attempts,
            ..RetryPolicy::default()
        };
        SessionConfig::new(base_url)
            .with_timeout(self.request_timeout)
            .with_retry(retry)
    }

    pub fn bank(&self) -> anyhow::Result<BankConfig> {
        let account_number = self
            .account_number
            .clone()
            .ok_or_else(|| anyhow!("ABNAMRO_ACCOUNT_NUMBER is not set"))?;
        let cookie_file = self
            .cookie_file
            .clone()
            .ok_or_else(|| anyhow!("ABNAMRO_COOKIE_FILE is not set"))?;
        Ok(BankConfig::new(account_number, cookie_file)
            .with_session(self.session(&self.bank_base_url)))
    }

    pub fn ics(&self) -> anyhow::Result<IcsConfig> {
        let username = self
            .ics_username
            .clone()
            .ok_or_else(|| anyhow!("ICS_USERNAME is not set"))?;
        let password = self
            .ics_password
            .clone()
            .ok_or_else(|| anyhow!("ICS_PASSWORD is not set"))?;
        Ok(IcsConfig::new(username, password).with_session(self.session(&self.ics_base_url)))
    }
}
