use std::fmt;

use abnamro_core::SessionConfig;

/// Default base URL of the ICS credit card portal.
pub const DEFAULT_BASE_URL: &str = "https://www.icscards.nl";

/// Settings for a [`CreditCard`](crate::CreditCard).
#[derive(Clone)]
pub struct IcsConfig {
    pub session: SessionConfig,
    pub username: String,
    pub password: String,
}

impl IcsConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            session: SessionConfig::new(DEFAULT_BASE_URL),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

impl fmt::Debug for IcsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IcsConfig")
            .field("session", &self.session)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
