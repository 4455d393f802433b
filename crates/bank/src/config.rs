use std::path::PathBuf;

use abnamro_core::SessionConfig;

/// Default base URL of the ABN AMRO online banking API.
pub const DEFAULT_BASE_URL: &str = "https://www.abnamro.nl";

/// Settings for an [`AccountContract`](crate::AccountContract).
#[derive(Clone, Debug)]
pub struct BankConfig {
    pub session: SessionConfig,
    /// Contract number of the account the cookies were exported for.
    pub account_number: String,
    /// Netscape cookie file exported from a logged in browser.
    pub cookie_file: PathBuf,
}

impl BankConfig {
    pub fn new(account_number: impl Into<String>, cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            session: SessionConfig::new(DEFAULT_BASE_URL),
            account_number: account_number.into(),
            cookie_file: cookie_file.into(),
        }
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
