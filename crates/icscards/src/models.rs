//! Data returned by the ICS portal.

use abnamro_core::serde_helpers::{lenient_bool, string_or_number};
use abnamro_core::{clean_up, impl_identity_eq, parse_date, Comparable, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn record_data<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

/// Models the credit card account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardAccount {
    #[serde(
        rename = "accountNumber",
        default,
        deserialize_with = "string_or_number"
    )]
    number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    product_id: Option<String>,
    credit_limit: Option<Decimal>,
    current_balance: Option<Decimal>,
    #[serde(rename = "creditLeftToUse")]
    available_credit: Option<Decimal>,
    authorized_balance: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_bool")]
    in_arrears: Option<bool>,
    arrears_status: Option<String>,
    #[serde(rename = "inOverLimit")]
    #[serde(default, deserialize_with = "lenient_bool")]
    in_overlimit: Option<bool>,
    loyalty_points: Option<Decimal>,
    loyalty_amount: Option<Decimal>,
    #[serde(rename = "valid")]
    #[serde(default, deserialize_with = "lenient_bool")]
    is_valid: Option<bool>,
    #[serde(rename = "paymentDate")]
    next_payment_date: Option<String>,
    #[serde(rename = "lastDayOfStatementToBePaid")]
    last_available_payment_date: Option<String>,
    amount_due: Option<Decimal>,
    due_date: Option<String>,
    iban: Option<String>,
    balance_carried_forward: Option<Decimal>,
    payment_condition: Option<String>,
    remaining_amount_due: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_bool")]
    credit_agreement: Option<bool>,
    payment_state: Option<String>,
    charge_percentage: Option<Decimal>,
    fixed_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_bool")]
    prepaid: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    continuous_credit: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    migrated: Option<bool>,
    #[serde(rename = "creditagreementConditional")]
    #[serde(default, deserialize_with = "lenient_bool")]
    credit_agreement_conditional: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    main_card_holder: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    app_enrolled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    over_limit: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CreditCardAccount {
    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    pub fn credit_limit(&self) -> Option<Decimal> {
        self.credit_limit
    }

    pub fn current_balance(&self) -> Option<Decimal> {
        self.current_balance
    }

    pub fn available_credit(&self) -> Option<Decimal> {
        self.available_credit
    }

    pub fn authorized_balance(&self) -> Option<Decimal> {
        self.authorized_balance
    }

    pub fn in_arrears(&self) -> Option<bool> {
        self.in_arrears
    }

    pub fn arrears_status(&self) -> Option<&str> {
        self.arrears_status.as_deref()
    }

    pub fn in_overlimit(&self) -> Option<bool> {
        self.in_overlimit
    }

    pub fn loyalty_points(&self) -> Option<Decimal> {
        self.loyalty_points
    }

    pub fn loyalty_amount(&self) -> Option<Decimal> {
        self.loyalty_amount
    }

    pub fn is_valid(&self) -> Option<bool> {
        self.is_valid
    }

    pub fn next_payment_date(&self) -> Option<&str> {
        self.next_payment_date.as_deref()
    }

    pub fn last_available_payment_date(&self) -> Option<&str> {
        self.last_available_payment_date.as_deref()
    }

    pub fn amount_due(&self) -> Option<Decimal> {
        self.amount_due
    }

    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    pub fn iban(&self) -> Option<&str> {
        self.iban.as_deref()
    }

    pub fn balance_carried_forward(&self) -> Option<Decimal> {
        self.balance_carried_forward
    }

    pub fn payment_condition(&self) -> Option<&str> {
        self.payment_condition.as_deref()
    }

    pub fn remaining_amount_due(&self) -> Option<Decimal> {
        self.remaining_amount_due
    }

    pub fn credit_agreement(&self) -> Option<bool> {
        self.credit_agreement
    }

    pub fn payment_state(&self) -> Option<&str> {
        self.payment_state.as_deref()
    }

    pub fn charge_percentage(&self) -> Option<Decimal> {
        self.charge_percentage
    }

    pub fn fixed_amount(&self) -> Option<Decimal> {
        self.fixed_amount
    }

    pub fn prepaid(&self) -> Option<bool> {
        self.prepaid
    }

    pub fn continuous_credit(&self) -> Option<bool> {
        self.continuous_credit
    }

    pub fn migrated(&self) -> Option<bool> {
        self.migrated
    }

    pub fn credit_agreement_conditional(&self) -> Option<bool> {
        self.credit_agreement_conditional
    }

    pub fn main_card_holder(&self) -> Option<bool> {
        self.main_card_holder
    }

    pub fn app_enrolled(&self) -> Option<bool> {
        self.app_enrolled
    }

    pub fn over_limit(&self) -> Option<bool> {
        self.over_limit
    }
}

impl Comparable for CreditCardAccount {
    fn comparable_data(&self) -> Value {
        record_data(self)
    }
}

/// Models a statement period, e.g. `2019-07`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default, deserialize_with = "string_or_number")]
    period: Option<String>,
    #[serde(rename = "startDatePeriod")]
    start_date: Option<String>,
    #[serde(rename = "endDatePeriod")]
    end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    current_period: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    show_statement: Option<bool>,
    balance_brought_forward: Option<Decimal>,
    balance_carried_forward: Option<Decimal>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Period {
    /// `YYYY-MM`, empty when the portal left it out.
    pub fn period(&self) -> &str {
        self.period.as_deref().unwrap_or_default()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(|d| parse_date(d).ok())
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(|d| parse_date(d).ok())
    }

    /// Whether this is the running period, whose transactions still change.
    pub fn is_current(&self) -> bool {
        self.current_period.unwrap_or(false)
    }

    pub fn show_statement(&self) -> Option<bool> {
        self.show_statement
    }

    pub fn balance_brought_forward(&self) -> Option<Decimal> {
        self.balance_brought_forward
    }

    pub fn balance_carried_forward(&self) -> Option<Decimal> {
        self.balance_carried_forward
    }
}

impl Comparable for Period {
    fn comparable_data(&self) -> Value {
        record_data(self)
    }
}

/// Models a credit card transaction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardTransaction {
    country_code: Option<String>,
    #[serde(
        rename = "lastFourDigits",
        default,
        deserialize_with = "string_or_number"
    )]
    card_last_four_digits: Option<String>,
    transaction_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
    billing_amount: Option<Decimal>,
    billing_currency: Option<String>,
    source_amount: Option<Decimal>,
    source_currency: Option<String>,
    #[serde(rename = "merchantCategoryCodeDescription")]
    merchant_category_description: Option<String>,
    type_of_transaction: Option<String>,
    #[serde(rename = "batchNr", default, deserialize_with = "string_or_number")]
    batch_number: Option<String>,
    #[serde(
        rename = "batchSequenceNr",
        default,
        deserialize_with = "string_or_number"
    )]
    batch_sequence_number: Option<String>,
    type_of_purchase: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    processing_time: Option<String>,
    indicator_extra_card: Option<String>,
    embossing_name: Option<String>,
    direct_debit_state: Option<String>,
    #[serde(rename = "mobile")]
    #[serde(default, deserialize_with = "lenient_bool")]
    is_mobile: Option<bool>,
    loyalty_points: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_bool")]
    charge_back_allowed: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CreditCardTransaction {
    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn card_last_four_digits(&self) -> Option<&str> {
        self.card_last_four_digits.as_deref()
    }

    pub fn billing_amount(&self) -> Option<Decimal> {
        self.billing_amount
    }

    pub fn billing_currency(&self) -> Option<&str> {
        self.billing_currency.as_deref()
    }

    pub fn source_amount(&self) -> Option<Decimal> {
        self.source_amount
    }

    pub fn source_currency(&self) -> Option<&str> {
        self.source_currency.as_deref()
    }

    pub fn merchant_category_description(&self) -> Option<&str> {
        self.merchant_category_description.as_deref()
    }

    pub fn type_of_transaction(&self) -> Option<&str> {
        self.type_of_transaction.as_deref()
    }

    pub fn batch_number(&self) -> Option<&str> {
        self.batch_number.as_deref()
    }

    pub fn batch_sequence_number(&self) -> Option<&str> {
        self.batch_sequence_number.as_deref()
    }

    pub fn type_of_purchase(&self) -> Option<&str> {
        self.type_of_purchase.as_deref()
    }

    pub fn processing_time(&self) -> Option<&str> {
        self.processing_time.as_deref()
    }

    pub fn indicator_extra_card(&self) -> Option<&str> {
        self.indicator_extra_card.as_deref()
    }

    pub fn embossing_name(&self) -> Option<&str> {
        self.embossing_name.as_deref()
    }

    pub fn direct_debit_state(&self) -> Option<&str> {
        self.direct_debit_state.as_deref()
    }

    pub fn is_mobile(&self) -> Option<bool> {
        self.is_mobile
    }

    pub fn loyalty_points(&self) -> Option<Decimal> {
        self.loyalty_points
    }

    pub fn charge_back_allowed(&self) -> Option<bool> {
        self.charge_back_allowed
    }
}

impl Comparable for CreditCardTransaction {
    fn comparable_data(&self) -> Value {
        record_data(self)
    }
}

impl Transaction for CreditCardTransaction {
    fn transaction_date(&self) -> Option<NaiveDate> {
        self.transaction_date
            .as_deref()
            .and_then(|d| parse_date(d).ok())
    }

    fn amount(&self) -> Option<Decimal> {
        self.billing_amount
    }

    fn description(&self) -> String {
        self.description.as_deref().map(clean_up).unwrap_or_default()
    }

    fn currency(&self) -> Option<&str> {
        self.billing_currency.as_deref()
    }
}

impl_identity_eq!(CreditCardAccount, Period, CreditCardTransaction);
