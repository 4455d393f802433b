//! abnamro-bank - ABN AMRO payment accounts.
//!
//! Authenticates with cookies exported from a logged in browser and exposes
//! the payment account contracts of the login, the primary account, foreign
//! accounts and their transactions ("mutations").
//!
//! # Core Types
//!
//! - [`AccountContract`] - Entry point for one login
//! - [`BankAccount`] - A contract bound to the session
//! - [`Contract`] - Payment account contract data
//! - [`AccountTransaction`] - A single mutation

pub mod client;
pub mod config;
pub mod contracts;
pub mod mutations;
pub mod transactions;

use abnamro_core::{CookieAuthenticator, Session};

pub use client::{AccountContract, BankAccount};
pub use config::{BankConfig, DEFAULT_BASE_URL};
pub use contracts::Contract;
pub use transactions::AccountTransaction;

/// Session authenticated with an exported cookie file.
pub type BankSession = Session<CookieAuthenticator>;
