use abnamro_bank::AccountContract;
use abnamro_core::FinancialInstrument;
use abnamro_icscards::CreditCard;
use anyhow::{bail, Context};
use futures::TryStreamExt;
use serde_json::Value;

use crate::config::Config;

pub const USAGE: &str = "\
Usage: abnamro <command> [arguments]

Bank commands (ABNAMRO_ACCOUNT_NUMBER, ABNAMRO_COOKIE_FILE):
  accounts                      payment accounts of the login
  foreign-accounts              accounts other than the login account
  transactions [FROM TO]        transactions of the login account
  latest                        most recent page of transactions

Credit card commands (ICS_USERNAME, ICS_PASSWORD):
  card                          credit card account
  card-periods                  statement periods
  card-transactions [YEAR MONTH]
                                transactions, all or of one period";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Accounts,
    ForeignAccounts,
    Transactions { range: Option<(String, String)> },
    Latest,
    Card,
    CardPeriods,
    CardTransactions { period: Option<(i32, u32)> },
}

impl Command {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };
        let command = match (name.as_str(), rest) {
            ("help" | "--help" | "-h", _) => Self::Help,
            ("accounts", []) => Self::Accounts,
            ("foreign-accounts", []) => Self::ForeignAccounts,
            ("transactions", []) => Self::Transactions { range: None },
            ("transactions", [from, to]) => Self::Transactions {
                range: Some((from.clone(), to.clone())),
            },
            ("latest", []) => Self::Latest,
            ("card", []) => Self::Card,
            ("card-periods", []) => Self::CardPeriods,
            ("card-transactions", []) => Self::CardTransactions { period: None },
            ("card-transactions", [year, month]) => {
                let year: i32 = year
                    .parse()
                    .with_context(|| format!("Invalid year: {}", year))?;
                let month: u32 = month
                    .parse()
                    .with_context(|| format!("Invalid month: {}", month))?;
                if !(1..=12).contains(&month) {
                    bail!("Invalid month: {}", month);
                }
                Self::CardTransactions {
                    period: Some((year, month)),
                }
            }
            (name, _) => bail!("Unknown command or arguments: {}\n\n{}", name, USAGE),
        };
        Ok(command)
    }
}

/// Executes `command` and returns what should be printed.
pub async fn run(command: Command, config: &Config) -> anyhow::Result<Value> {
    match command {
        Command::Help => Ok(Value::String(USAGE.to_string())),
        Command::Accounts => {
            let bank = AccountContract::new(config.bank()?).await?;
            let accounts = bank.accounts().await?;
            let contracts: Vec<_> = accounts.iter().map(|account| account.contract()).collect();
            Ok(serde_json::to_value(contracts)?)
        }
        Command::ForeignAccounts => {
            let bank = AccountContract::new(config.bank()?).await?;
            let accounts = bank.foreign_accounts().await?;
            let contracts: Vec<_> = accounts.iter().map(|account| account.contract()).collect();
            Ok(serde_json::to_value(contracts)?)
        }
        Command::Transactions { range } => {
            let bank = AccountContract::new(config.bank()?).await?;
            let transactions = match range {
                Some((from, to)) => bank.transactions_for_date_range(&from, &to).await?,
                None => bank.transactions().await?.try_collect().await?,
            };
            tracing::info!("Retrieved {} transactions", transactions.len());
            Ok(serde_json::to_value(transactions)?)
        }
        Command::Latest => {
            let bank = AccountContract::new(config.bank()?).await?;
            Ok(serde_json::to_value(bank.latest_transactions().await?)?)
        }
        Command::Card => {
            let card = CreditCard::new(config.ics()?).await?;
            Ok(serde_json::to_value(card.account())?)
        }
        Command::CardPeriods => {
            let card = CreditCard::new(config.ics()?).await?;
            Ok(serde_json::to_value(card.periods().await?)?)
        }
        Command::CardTransactions { period } => {
            let card = CreditCard::new(config.ics()?).await?;
            let transactions = match period {
                Some((year, month)) => card.get_transactions_for_period(year, month).await?,
                None => card.all_transactions().await?,
            };
            tracing::info!("Retrieved {} card transactions", transactions.len());
            Ok(serde_json::to_value(transactions)?)
        }
    }
}
