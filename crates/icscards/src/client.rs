use std::collections::HashMap;
use std::fmt;

use abnamro_core::serde_helpers::string_or_number;
use abnamro_core::{
    impl_identity_eq, Comparable, DateRange, Error, FinancialInstrument, Result, Session,
    Transaction, TransactionStream,
};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

use crate::auth::CredentialsAuthenticator;
use crate::config::IcsConfig;
use crate::models::{CreditCardAccount, CreditCardTransaction, Period};
use crate::IcsSession;

const ALL_ACCOUNTS_PATH: &str = "/sec/nl/sec/allaccountsv2";
const ACCOUNT_PATH: &str = "/sec/nl/sec/accountv5";
const PERIODS_PATH: &str = "/sec/nl/sec/periods";
const TRANSACTIONS_PATH: &str = "/sec/nl/sec/transactions";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSummary {
    #[serde(default, deserialize_with = "string_or_number")]
    account_number: Option<String>,
}

/// Parses transaction entries one by one, skipping the unusable ones.
fn parse_transactions(entries: Vec<Value>) -> Vec<CreditCardTransaction> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(transaction) => Some(transaction),
            Err(e) => {
                warn!("[IcsCards] Skipping malformed transaction: {}", e);
                None
            }
        })
        .collect()
}

/// Parses period entries one by one, skipping the unusable ones and those
/// without a `YYYY-MM` label.
fn parse_periods(entries: Vec<Value>) -> Vec<Period> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Period>(entry) {
            Ok(period) if period.period().is_empty() => {
                warn!("[IcsCards] Skipping statement period without a label");
                None
            }
            Ok(period) => Some(period),
            Err(e) => {
                warn!("[IcsCards] Skipping malformed statement period: {}", e);
                None
            }
        })
        .collect()
}

/// Models a credit card account behind an authenticated ICS session.
pub struct CreditCard {
    session: IcsSession,
    account_number: String,
    account: CreditCardAccount,
    periods: OnceCell<Vec<Period>>,
    /// Transactions of closed periods, keyed by `YYYY-MM`.
    period_cache: Mutex<HashMap<String, Vec<CreditCardTransaction>>>,
}

impl CreditCard {
    /// Logs in and loads the card account.
    pub async fn new(config: IcsConfig) -> Result<Self> {
        let authenticator = CredentialsAuthenticator::new(config.username, config.password);
        let session = Session::connect(authenticator, config.session).await?;

        let accounts: Vec<AccountSummary> = session.get_json(ALL_ACCOUNTS_PATH, &[], &[]).await?;
        let account_number = accounts
            .into_iter()
            .next()
            .and_then(|summary| summary.account_number)
            .ok_or_else(|| Error::AccountNotFound("no credit card account".to_string()))?;
        debug!("[IcsCards] Using credit card account {}", account_number);

        let account: CreditCardAccount = session
            .get_json(
                ACCOUNT_PATH,
                &[("accountNumber", account_number.as_str())],
                &[],
            )
            .await?;

        Ok(Self {
            session,
            account_number,
            account,
            periods: OnceCell::new(),
            period_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Account number of the card account, as used by the portal.
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn account(&self) -> &CreditCardAccount {
        &self.account
    }

    pub fn session(&self) -> &IcsSession {
        &self.session
    }

    /// Statement periods, oldest first as the portal lists them.
    pub async fn periods(&self) -> Result<&[Period]> {
        let periods = self
            .periods
            .get_or_try_init(|| async {
                let entries: Vec<Value> = self
                    .session
                    .get_json(
                        PERIODS_PATH,
                        &[("accountNumber", self.account_number.as_str())],
                        &[],
                    )
                    .await?;
                let periods = parse_periods(entries);
                info!("[IcsCards] Retrieved {} statement periods", periods.len());
                Ok::<_, Error>(periods)
            })
            .await?;
        Ok(periods.as_slice())
    }

    /// The period for `year` and `month`, if the portal has one.
    pub async fn get_period(&self, year: i32, month: u32) -> Result<Option<&Period>> {
        let wanted = format!("{}-{:02}", year, month);
        let periods = self.periods().await?;
        Ok(periods.iter().find(|period| period.period() == wanted))
    }

    /// Transactions of the period for `year` and `month`, empty when there
    /// is no such period.
    pub async fn get_transactions_for_period(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<CreditCardTransaction>> {
        match self.get_period(year, month).await? {
            Some(period) => self.period_transactions(period).await,
            None => {
                debug!("[IcsCards] No period {}-{:02}", year, month);
                Ok(Vec::new())
            }
        }
    }

    /// Transactions of `period`; closed periods are fetched once.
    pub async fn period_transactions(&self, period: &Period) -> Result<Vec<CreditCardTransaction>> {
        let key = period.period();
        if !period.is_current() {
            if let Some(cached) = self.period_cache.lock().await.get(key) {
                return Ok(cached.clone());
            }
        }

        let entries: Vec<Value> = self
            .session
            .get_json(
                TRANSACTIONS_PATH,
                &[
                    ("accountNumber", self.account_number.as_str()),
                    ("flushCache", "true"),
                    ("fromPeriod", key),
                    ("untilPeriod", key),
                ],
                &[],
            )
            .await?;
        let transactions = parse_transactions(entries);
        debug!(
            "[IcsCards] Fetched {} transactions for period {}",
            transactions.len(),
            key
        );

        if !period.is_current() {
            self.period_cache
                .lock()
                .await
                .insert(key.to_string(), transactions.clone());
        }
        Ok(transactions)
    }

    /// Transactions of the running period.
    pub async fn current_period_transactions(&self) -> Result<Vec<CreditCardTransaction>> {
        let entries: Vec<Value> = self
            .session
            .get_json(
                TRANSACTIONS_PATH,
                &[
                    ("accountNumber", self.account_number.as_str()),
                    ("flushCache", "true"),
                ],
                &[],
            )
            .await?;
        Ok(parse_transactions(entries))
    }

    /// Transactions of `period`, or none when retrieving them fails.
    async fn period_transactions_or_skip(&self, period: &Period) -> Vec<CreditCardTransaction> {
        match self.period_transactions(period).await {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!(
                    "[IcsCards] Skipping period {} after failed retrieval: {}",
                    period.period(),
                    e
                );
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("account_number", &self.account_number)
            .finish_non_exhaustive()
    }
}

impl Comparable for CreditCard {
    fn comparable_data(&self) -> Value {
        self.account.comparable_data()
    }
}

impl_identity_eq!(CreditCard);

#[async_trait]
impl FinancialInstrument for CreditCard {
    type Transaction = CreditCardTransaction;

    fn account_number(&self) -> Option<&str> {
        Some(self.account_number.as_str())
    }

    async fn latest_transactions(&self) -> Result<Vec<CreditCardTransaction>> {
        self.current_period_transactions().await
    }

    fn transactions(&self) -> TransactionStream<'_, CreditCardTransaction> {
        stream::try_unfold(0usize, move |index| async move {
            let periods = self.periods().await?;
            let Some(period) = periods.get(index) else {
                return Ok::<_, Error>(None);
            };
            let transactions = self.period_transactions_or_skip(period).await;
            let items = stream::iter(transactions.into_iter().map(Ok::<_, Error>));
            Ok(Some((items, index + 1)))
        })
        .try_flatten()
        .boxed()
    }

    async fn transactions_for_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<CreditCardTransaction>> {
        let range = DateRange::parse(start, end)?;
        let periods = self.periods().await?;
        let overlapping: Vec<bool> = periods
            .iter()
            .map(|period| match (period.start_date(), period.end_date()) {
                (Some(first), Some(last)) => range.overlaps(first, last),
                _ => true,
            })
            .collect();

        let mut found = Vec::new();
        for (index, (period, overlaps)) in periods.iter().zip(&overlapping).enumerate() {
            // Purchases late in a period are booked in the one after it.
            let follows_overlap = index
                .checked_sub(1)
                .and_then(|previous| overlapping.get(previous))
                .copied()
                .unwrap_or(false);
            if !overlaps && !follows_overlap {
                continue;
            }
            found.extend(
                self.period_transactions_or_skip(period)
                    .await
                    .into_iter()
                    .filter(|t| t.transaction_date().is_some_and(|d| range.contains(d))),
            );
        }
        Ok(found)
    }
}
