//! Error types and retry classification shared by the bank and credit card clients.
//!
//! This module provides:
//! - [`Error`]: The root error enum for every retrieval operation
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while authenticating or retrieving data.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Error, Debug)]
pub enum Error {
    /// The credentials were rejected or the login produced no usable session.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The cookie file could not be read or contained no usable cookies.
    #[error("Invalid cookies: {0}")]
    InvalidCookies(String),

    /// A date string matched none of the supported formats.
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    /// A date parsed fine but cannot be used for searching.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The session stayed expired even after re-authenticating.
    #[error("Session expired for {0}")]
    SessionExpired(String),

    /// No account matches the requested number.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The server answered with a non-success status that retrying won't fix.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The server is temporarily unable to answer (429 or 5xx gateway errors).
    #[error("Service unavailable: HTTP {status} from {url}")]
    Transient { status: u16, url: String },

    /// The request did not complete within the configured timeout.
    #[error("Timeout: {url}")]
    Timeout { url: String },

    /// A transport level error from the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected.
    #[error("Failed to parse response from {url}: {message}")]
    Deserialize { url: String, message: String },

    /// Missing or malformed configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use abnamro_core::errors::{Error, RetryClass};
    ///
    /// let error = Error::Transient { status: 503, url: "https://www.abnamro.nl/contracts".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = Error::AccountNotFound("123".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry with backoff
            Self::Transient { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,
            Self::Network(e) if e.is_timeout() || e.is_connect() => RetryClass::WithBackoff,

            // Everything else is terminal
            _ => RetryClass::Never,
        }
    }

    /// Maps a transport error into the most specific variant for `url`.
    pub fn from_request(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network(error)
        }
    }
}
