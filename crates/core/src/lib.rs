//! abnamro-core - Shared building blocks for the ABN AMRO clients.
//!
//! This crate contains everything the bank and the credit card clients have
//! in common: the error type, the retry/backoff policy, cookie-file
//! authentication, the authenticated session, date handling and the
//! identity rules that make retrieved entities comparable.
//!
//! # Core Types
//!
//! - [`Session`] - Authenticated HTTP session with expiry detection
//! - [`Authenticator`] - Produces authenticated clients for a portal
//! - [`CookieAuthenticator`] - Authenticates from an exported cookie file
//! - [`RetryPolicy`] - Exponential backoff settings for GET calls
//! - [`Comparable`] / [`Identity`] - Content based identity
//! - [`FinancialInstrument`] / [`Transaction`] - Contracts shared by accounts and cards

pub mod backoff;
pub mod comparable;
pub mod cookies;
pub mod dates;
pub mod errors;
pub mod instrument;
pub mod serde_helpers;
pub mod session;

pub use backoff::{with_backoff, RetryPolicy};
pub use comparable::{dedup_by_identity, Comparable, Identity};
pub use cookies::{Cookie, CookieAuthenticator};
pub use dates::{parse_date, DateRange};
pub use instrument::{clean_up, FinancialInstrument, Transaction, TransactionStream};
pub use session::{AuthenticatedClient, Authenticator, Session, SessionConfig};

// Re-export error types
pub use errors::{Error, Result, RetryClass};
