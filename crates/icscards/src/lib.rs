//! abnamro-icscards - ICS credit cards.
//!
//! Logs in to the ICS portal with a username and password and exposes the
//! card account, its statement periods and their transactions.
//!
//! # Core Types
//!
//! - [`CreditCard`] - Authenticated card client
//! - [`CreditCardAccount`] - Card account data
//! - [`Period`] - A statement period
//! - [`CreditCardTransaction`] - A single card transaction

pub mod auth;
pub mod client;
pub mod config;
pub mod models;

use abnamro_core::Session;

pub use auth::CredentialsAuthenticator;
pub use client::CreditCard;
pub use config::{IcsConfig, DEFAULT_BASE_URL};
pub use models::{CreditCardAccount, CreditCardTransaction, Period};

/// Session authenticated with portal credentials.
pub type IcsSession = Session<CredentialsAuthenticator>;
