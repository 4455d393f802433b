//! Models a banking transaction ("mutation" in the ABN AMRO API).

use abnamro_core::serde_helpers::{epoch_millis, lenient_bool, string_list, string_or_number};
use abnamro_core::{clean_up, dates, impl_identity_eq, Comparable, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single account mutation.
///
/// Timestamps are kept as the epoch milliseconds the API sends; the date
/// accessors convert them to Amsterdam calendar dates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransaction {
    #[serde(default, deserialize_with = "string_or_number")]
    mutation_code: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    description_lines: Vec<String>,
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "epoch_millis")]
    transaction_date: Option<i64>,
    #[serde(default, deserialize_with = "epoch_millis")]
    value_date: Option<i64>,
    #[serde(default, deserialize_with = "epoch_millis")]
    book_date: Option<i64>,
    balance_after_mutation: Option<Decimal>,
    debit_credit: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    indicator_digital_invoice: Option<bool>,
    #[serde(default, deserialize_with = "string_or_number")]
    counter_account_number: Option<String>,
    counter_account_type: Option<String>,
    counter_account_name: Option<String>,
    currency_iso_code: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    source_inquiry_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    account_number: Option<String>,
    account_number_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    transaction_timestamp: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    status_timestamp: Option<String>,
    /// Fields this model does not name, kept so identity covers the whole record.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl AccountTransaction {
    pub fn mutation_code(&self) -> Option<&str> {
        self.mutation_code.as_deref()
    }

    pub fn description_lines(&self) -> &[String] {
        &self.description_lines
    }

    pub fn value_date(&self) -> Option<NaiveDate> {
        self.value_date.and_then(dates::date_from_epoch_millis)
    }

    pub fn book_date(&self) -> Option<NaiveDate> {
        self.book_date.and_then(dates::date_from_epoch_millis)
    }

    pub fn balance_after_mutation(&self) -> Option<Decimal> {
        self.balance_after_mutation
    }

    /// `DEBIT` or `CREDIT`.
    pub fn transaction_type(&self) -> Option<&str> {
        self.debit_credit.as_deref()
    }

    pub fn indicator_digital_invoice(&self) -> Option<bool> {
        self.indicator_digital_invoice
    }

    pub fn counter_account_number(&self) -> Option<&str> {
        self.counter_account_number.as_deref()
    }

    pub fn counter_account_type(&self) -> Option<&str> {
        self.counter_account_type.as_deref()
    }

    pub fn counter_account_name(&self) -> Option<&str> {
        self.counter_account_name.as_deref()
    }

    pub fn currency_iso_code(&self) -> Option<&str> {
        self.currency_iso_code.as_deref()
    }

    pub fn source_inquiry_number(&self) -> Option<&str> {
        self.source_inquiry_number.as_deref()
    }

    pub fn account_number(&self) -> Option<&str> {
        self.account_number.as_deref()
    }

    pub fn account_number_type(&self) -> Option<&str> {
        self.account_number_type.as_deref()
    }

    pub fn transaction_timestamp(&self) -> Option<&str> {
        self.transaction_timestamp.as_deref()
    }

    pub fn status_timestamp(&self) -> Option<&str> {
        self.status_timestamp.as_deref()
    }
}

impl Comparable for AccountTransaction {
    fn comparable_data(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl_identity_eq!(AccountTransaction);

impl Transaction for AccountTransaction {
    fn transaction_date(&self) -> Option<NaiveDate> {
        self.transaction_date.and_then(dates::date_from_epoch_millis)
    }

    fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    fn description(&self) -> String {
        self.description_lines
            .iter()
            .map(|line| clean_up(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn currency(&self) -> Option<&str> {
        self.currency_iso_code.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn mutation() -> Value {
        json!({
            "mutationCode": "BA",
            "descriptionLines": [
                "BEA   NR:XXX1234   18.07.19/12.34",
                "ALBERT HEIJN 1234,PAS123        ",
                ""
            ],
            "amount": -23.45,
            "transactionDate": 1563400000000_i64,
            "valueDate": "1563400000000",
            "bookDate": 1563489000000_i64,
            "balanceAfterMutation": 1234.56,
            "debitCredit": "DEBIT",
            "indicatorDigitalInvoice": false,
            "counterAccountNumber": 123456789,
            "counterAccountType": "DOMESTIC",
            "counterAccountName": "ALBERT HEIJN 1234",
            "currencyIsoCode": "EUR",
            "sourceInquiryNumber": "0000000000000001",
            "accountNumber": "NL12ABNA0123456789",
            "accountNumberType": "IBAN",
            "transactionTimestamp": "20190717234640000",
            "statusTimestamp": "20190718000000000",
            "mutationKey": "k-1"
        })
    }

    #[test]
    fn test_accessors() {
        let tx: AccountTransaction = serde_json::from_value(mutation()).unwrap();
        assert_eq!(tx.mutation_code(), Some("BA"));
        assert_eq!(tx.amount(), Some(dec!(-23.45)));
        assert_eq!(tx.balance_after_mutation(), Some(dec!(1234.56)));
        assert_eq!(tx.transaction_type(), Some("DEBIT"));
        assert_eq!(tx.counter_account_number(), Some("123456789"));
        assert_eq!(tx.currency(), Some("EUR"));
        assert_eq!(tx.account_number(), Some("NL12ABNA0123456789"));
        assert_eq!(tx.transaction_date(), NaiveDate::from_ymd_opt(2019, 7, 17));
        assert_eq!(tx.value_date(), NaiveDate::from_ymd_opt(2019, 7, 17));
        assert_eq!(tx.book_date(), NaiveDate::from_ymd_opt(2019, 7, 19));
    }

    #[test]
    fn test_description_is_cleaned_and_joined() {
        let tx: AccountTransaction = serde_json::from_value(mutation()).unwrap();
        assert_eq!(
            tx.description(),
            "BEA NR:XXX1234 18.07.19/12.34 ALBERT HEIJN 1234,PAS123"
        );
    }

    #[test]
    fn test_missing_fields_parse() {
        let tx: AccountTransaction = serde_json::from_value(json!({})).unwrap();
        assert_eq!(tx.transaction_date(), None);
        assert_eq!(tx.description(), "");
    }

    #[test]
    fn test_null_fields_parse() {
        let tx: AccountTransaction = serde_json::from_value(json!({
            "amount": -5.0,
            "descriptionLines": null,
            "indicatorDigitalInvoice": "false",
            "counterAccountName": null,
            "transactionDate": 1563400000000i64
        }))
        .unwrap();
        assert!(tx.description_lines().is_empty());
        assert_eq!(tx.indicator_digital_invoice(), Some(false));
        assert_eq!(tx.amount(), Some(dec!(-5.0)));

        let tx: AccountTransaction =
            serde_json::from_value(json!({"descriptionLines": ["BEA", null, "ALBERT HEIJN"]})).unwrap();
        assert_eq!(tx.description(), "BEA ALBERT HEIJN");
    }

    #[test]
    fn test_identity_covers_unknown_fields() {
        let a: AccountTransaction = serde_json::from_value(mutation()).unwrap();
        let mut other = mutation();
        other["mutationKey"] = json!("k-2");
        let b: AccountTransaction = serde_json::from_value(other).unwrap();
        let c: AccountTransaction = serde_json::from_value(mutation()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
