//! Contracts shared by bank accounts and credit cards.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use rust_decimal::Decimal;

use crate::comparable::Comparable;
use crate::errors::Result;

/// Stream of transactions, newest page first for bank accounts and oldest
/// period first for credit cards.
pub type TransactionStream<'a, T> = BoxStream<'a, Result<T>>;

/// Collapses every run of whitespace into a single space.
///
/// The portals pad descriptions to fixed width columns.
pub fn clean_up(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Interface for a transaction object.
pub trait Transaction: Comparable {
    fn transaction_date(&self) -> Option<NaiveDate>;

    /// Signed amount in the account currency.
    fn amount(&self) -> Option<Decimal>;

    fn description(&self) -> String;

    fn currency(&self) -> Option<&str>;
}

/// A financial instrument whose transactions can be retrieved.
///
/// Bank accounts and credit cards both implement it, so callers can treat
/// them uniformly.
#[async_trait]
pub trait FinancialInstrument: Comparable + Send + Sync {
    type Transaction: Transaction + Send + 'static;

    fn account_number(&self) -> Option<&str>;

    /// The most recent transactions: the first page for a bank account, the
    /// running period for a credit card.
    async fn latest_transactions(&self) -> Result<Vec<Self::Transaction>>;

    /// Every available transaction.
    fn transactions(&self) -> TransactionStream<'_, Self::Transaction>;

    /// Transactions dated within `start..=end`, both free-form date strings.
    async fn transactions_for_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<Self::Transaction>>;

    /// Drains [`transactions`](Self::transactions) into a vector.
    async fn all_transactions(&self) -> Result<Vec<Self::Transaction>> {
        self.transactions().try_collect().await
    }
}
