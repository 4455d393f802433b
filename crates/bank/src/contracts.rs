use abnamro_core::serde_helpers::string_or_number;
use abnamro_core::{impl_identity_eq, Comparable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Models a payment account contract as listed under `contractList`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    contract: ContractDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_contract: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractDetails {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    contract_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    account_number: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Contract {
    /// Contract number, the number the user logs in with.
    pub fn number(&self) -> Option<&str> {
        self.contract.contract_number.as_deref()
    }

    /// IBAN of the account.
    pub fn account_number(&self) -> Option<&str> {
        self.contract.account_number.as_deref()
    }

    pub fn product(&self) -> Option<&Value> {
        self.product.as_ref()
    }

    pub fn customer(&self) -> Option<&Value> {
        self.customer.as_ref()
    }

    pub fn parent_contract(&self) -> Option<&Value> {
        self.parent_contract.as_ref()
    }
}

impl Comparable for Contract {
    fn comparable_data(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl_identity_eq!(Contract);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract_json() -> Value {
        json!({
            "contract": {
                "contractNumber": 123456789,
                "accountNumber": "NL12ABNA0123456789",
                "status": "ACTIVE"
            },
            "product": {"id": 4, "name": "Betaalrekening"},
            "customer": {"interpretedName": "J. JANSEN"},
            "actionNames": ["VIEW_MUTATIONS"]
        })
    }

    #[test]
    fn test_contract_accessors() {
        let contract: Contract = serde_json::from_value(contract_json()).unwrap();
        assert_eq!(contract.number(), Some("123456789"));
        assert_eq!(contract.account_number(), Some("NL12ABNA0123456789"));
        assert_eq!(contract.product().unwrap()["name"], "Betaalrekening");
        assert_eq!(contract.customer().unwrap()["interpretedName"], "J. JANSEN");
        assert!(contract.parent_contract().is_none());
    }

    #[test]
    fn test_unknown_fields_are_kept_for_identity() {
        let contract: Contract = serde_json::from_value(contract_json()).unwrap();
        let data = contract.comparable_data();
        assert_eq!(data["contract"]["status"], "ACTIVE");
        assert_eq!(data["actionNames"][0], "VIEW_MUTATIONS");

        let mut changed = contract_json();
        changed["contract"]["status"] = json!("BLOCKED");
        let other: Contract = serde_json::from_value(changed).unwrap();
        assert_ne!(contract, other);
    }

    #[test]
    fn test_empty_entry_parses() {
        let contract: Contract = serde_json::from_value(json!({})).unwrap();
        assert_eq!(contract.number(), None);
        assert_eq!(contract.account_number(), None);
    }
}
