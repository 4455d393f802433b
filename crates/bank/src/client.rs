use std::fmt;
use std::sync::Arc;

use abnamro_core::{
    impl_identity_eq, Comparable, CookieAuthenticator, DateRange, Error, FinancialInstrument,
    Result, Session, TransactionStream,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::BankConfig;
use crate::contracts::Contract;
use crate::mutations::{fetch_page, mutation_stream, mutations_in_range};
use crate::transactions::AccountTransaction;
use crate::BankSession;

const SERVICE_VERSION_HEADER: &str = "x-aab-serviceversion";
const CONTRACTS_SERVICE_VERSION: &str = "v2";
const PAYMENT_ACCOUNTS: &str = "PAYMENT_ACCOUNTS";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractsResponse {
    #[serde(default)]
    contract_list: Vec<Contract>,
}

/// Client for the payment accounts of one ABN AMRO login.
pub struct AccountContract {
    session: Arc<BankSession>,
    account_number: String,
    contracts: OnceCell<Vec<Contract>>,
    iban_number: OnceCell<String>,
}

impl AccountContract {
    /// Authenticates with the exported cookies of `config`.
    pub async fn new(config: BankConfig) -> Result<Self> {
        let authenticator = CookieAuthenticator::new(config.cookie_file);
        let session = Session::connect(authenticator, config.session).await?;
        Ok(Self {
            session: Arc::new(session),
            account_number: config.account_number,
            contracts: OnceCell::new(),
            iban_number: OnceCell::new(),
        })
    }

    /// The contract number this session logged in with.
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn session(&self) -> &Arc<BankSession> {
        &self.session
    }

    /// Payment account contracts visible to the session, fetched once.
    pub async fn contracts(&self) -> Result<&[Contract]> {
        let contracts = self
            .contracts
            .get_or_try_init(|| async {
                let response: ContractsResponse = self
                    .session
                    .get_json(
                        "/contracts",
                        &[("productGroups", PAYMENT_ACCOUNTS)],
                        &[(SERVICE_VERSION_HEADER, CONTRACTS_SERVICE_VERSION)],
                    )
                    .await?;
                info!(
                    "[AbnAmro] Retrieved {} payment account contracts",
                    response.contract_list.len()
                );
                Ok::<_, Error>(response.contract_list)
            })
            .await?;
        Ok(contracts.as_slice())
    }

    fn primary_contract<'a>(&self, contracts: &'a [Contract]) -> Option<&'a Contract> {
        contracts
            .iter()
            .find(|contract| contract.number() == Some(self.account_number.as_str()))
    }

    /// IBAN of the logged in account.
    pub async fn iban_number(&self) -> Result<&str> {
        let iban = self
            .iban_number
            .get_or_try_init(|| async {
                let contracts = self.contracts().await?;
                self.primary_contract(contracts)
                    .and_then(Contract::account_number)
                    .map(str::to_string)
                    .ok_or_else(|| Error::AccountNotFound(self.account_number.clone()))
            })
            .await?;
        Ok(iban.as_str())
    }

    fn bind(&self, contract: &Contract) -> BankAccount {
        BankAccount {
            session: Arc::clone(&self.session),
            primary: contract.number() == Some(self.account_number.as_str()),
            contract: contract.clone(),
        }
    }

    /// The account this session logged in with.
    pub async fn account(&self) -> Result<BankAccount> {
        let contracts = self.contracts().await?;
        self.primary_contract(contracts)
            .map(|contract| self.bind(contract))
            .ok_or_else(|| Error::AccountNotFound(self.account_number.clone()))
    }

    /// Every payment account visible to the session.
    pub async fn accounts(&self) -> Result<Vec<BankAccount>> {
        let contracts = self.contracts().await?;
        Ok(contracts.iter().map(|contract| self.bind(contract)).collect())
    }

    /// Accounts the user can see but did not log in with.
    pub async fn foreign_accounts(&self) -> Result<Vec<BankAccount>> {
        let accounts = self.accounts().await?;
        Ok(accounts
            .into_iter()
            .filter(|account| !account.is_primary())
            .collect())
    }

    /// Looks an account up by IBAN, ignoring case and spaces.
    pub async fn get_account(&self, iban: &str) -> Result<BankAccount> {
        let wanted = normalize_iban(iban);
        let contracts = self.contracts().await?;
        contracts
            .iter()
            .find(|contract| {
                contract
                    .account_number()
                    .map(|number| normalize_iban(number) == wanted)
                    .unwrap_or(false)
            })
            .map(|contract| self.bind(contract))
            .ok_or_else(|| Error::AccountNotFound(iban.to_string()))
    }

    /// Every transaction of the logged in account, newest first.
    pub async fn transactions(&self) -> Result<TransactionStream<'_, AccountTransaction>> {
        let iban = self.iban_number().await?;
        Ok(mutation_stream(&self.session, iban))
    }

    /// The first page of mutations of the logged in account.
    pub async fn latest_transactions(&self) -> Result<Vec<AccountTransaction>> {
        let iban = self.iban_number().await?;
        Ok(fetch_page(&self.session, iban, None).await?.transactions)
    }

    /// Transactions of the logged in account dated within `start..=end`.
    pub async fn transactions_for_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<AccountTransaction>> {
        let range = DateRange::parse(start, end)?;
        let iban = self.iban_number().await?;
        mutations_in_range(&self.session, iban, range).await
    }
}

fn normalize_iban(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// A payment account contract bound to the authenticated session.
#[derive(Clone)]
pub struct BankAccount {
    session: Arc<BankSession>,
    contract: Contract,
    primary: bool,
}

impl BankAccount {
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Whether this is the account the session logged in with.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn number(&self) -> Option<&str> {
        self.contract.number()
    }

    fn iban(&self) -> Result<&str> {
        self.contract.account_number().ok_or_else(|| {
            Error::AccountNotFound(self.contract.number().unwrap_or_default().to_string())
        })
    }
}

impl fmt::Debug for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankAccount")
            .field("number", &self.contract.number())
            .field("iban", &self.contract.account_number())
            .field("primary", &self.primary)
            .finish()
    }
}

impl Comparable for BankAccount {
    fn comparable_data(&self) -> Value {
        self.contract.comparable_data()
    }
}

impl_identity_eq!(BankAccount);

#[async_trait]
impl FinancialInstrument for BankAccount {
    type Transaction = AccountTransaction;

    fn account_number(&self) -> Option<&str> {
        self.contract.account_number()
    }

    async fn latest_transactions(&self) -> Result<Vec<AccountTransaction>> {
        let iban = self.iban()?;
        Ok(fetch_page(&self.session, iban, None).await?.transactions)
    }

    fn transactions(&self) -> TransactionStream<'_, AccountTransaction> {
        match self.iban() {
            Ok(iban) => mutation_stream(&self.session, iban),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn transactions_for_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<AccountTransaction>> {
        let range = DateRange::parse(start, end)?;
        let iban = self.iban()?;
        debug!(
            "[AbnAmro] Searching {} from {} to {}",
            iban, range.start, range.end
        );
        mutations_in_range(&self.session, iban, range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_iban() {
        assert_eq!(
            normalize_iban("nl12 abna 0123 4567 89"),
            "NL12ABNA0123456789"
        );
        assert_eq!(normalize_iban("NL12ABNA0123456789"), "NL12ABNA0123456789");
    }

    #[test]
    fn test_contracts_response_without_list() {
        let response: ContractsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.contract_list.is_empty());
    }
}
