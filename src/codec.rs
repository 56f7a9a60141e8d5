//! Entity encoding and primary-key layout.
//!
//! Every entity kind lives under its own key prefix (`bank:B1`,
//! `account:A1`, ...), so equal IDs of different kinds never collide.
//! Records are stored as field-name keyed JSON.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reserved by the composite index; never allowed inside an ID.
pub const SEPARATOR: char = '\u{0}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Bank,
    Customer,
    Account,
    Payment,
}

impl Kind {
    pub fn prefix(self) -> &'static str {
        match self {
            Kind::Bank => "bank:",
            Kind::Customer => "customer:",
            Kind::Account => "account:",
            Kind::Payment => "payment:",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bank => "bank",
            Kind::Customer => "customer",
            Kind::Account => "account",
            Kind::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// A record kind the repository knows how to store.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: Kind;

    fn id(&self) -> &str;

    fn key(&self) -> String {
        entity_key(Self::KIND, self.id())
    }
}

pub fn entity_key(kind: Kind, id: &str) -> String {
    format!("{}{}", kind.prefix(), id)
}

/// Rejects IDs that cannot be stored or indexed unambiguously.
pub fn validate_id(kind: Kind, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidArgument(format!("{kind} id must not be empty")));
    }
    if id.contains(SEPARATOR) {
        return Err(Error::InvalidArgument(format!(
            "{kind} id {id:?} contains the reserved separator"
        )));
    }
    Ok(())
}

pub fn encode<E: Entity>(entity: &E) -> Result<Vec<u8>> {
    serde_json::to_vec(entity).map_err(|err| Error::CorruptRecord {
        key: entity.key(),
        reason: err.to_string(),
    })
}

pub fn decode<E: Entity>(key: &str, bytes: &[u8]) -> Result<E> {
    serde_json::from_slice(bytes).map_err(|err| Error::CorruptRecord {
        key: key.to_owned(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Account, Bank, Customer, Payment};
    use rust_decimal_macros::dec;

    fn bank() -> Bank {
        Bank {
            name: "BankOne".into(),
            bank_id: "B1".into(),
            bank_admin_id: "admin".into(),
            password: "pw".into(),
            country: "US".into(),
            currency: "USD".into(),
            reserves: dec!(1000.25),
            account_ids: vec!["A1".into(), "A2".into()],
            exchange_rate: dec!(1.0),
        }
    }

    #[test]
    fn test_keys_are_namespaced_per_kind() {
        assert_eq!(entity_key(Kind::Bank, "X"), "bank:X");
        assert_eq!(entity_key(Kind::Account, "X"), "account:X");
        assert_ne!(entity_key(Kind::Customer, "X"), entity_key(Kind::Payment, "X"));
        assert_eq!(bank().key(), "bank:B1");
    }

    #[test]
    fn test_bank_wire_format_uses_camel_case_field_names() {
        let json: serde_json::Value = serde_json::from_slice(&encode(&bank()).unwrap()).unwrap();
        assert_eq!(json["bankID"], "B1");
        assert_eq!(json["bankAdminID"], "admin");
        assert_eq!(json["accountIDs"][1], "A2");
        // Decimals are persisted as exact strings
        assert_eq!(json["reserves"], "1000.25");
    }

    #[test]
    fn test_account_primary_key_is_serialized_as_id() {
        let account = Account {
            account_id: "A1".into(),
            customer_id: "C1".into(),
            bank_id: "B1".into(),
            balance: dec!(100),
            currency: "USD".into(),
            payment_ids: vec![],
        };
        let json: serde_json::Value =
            serde_json::from_slice(&encode(&account).unwrap()).unwrap();
        assert_eq!(json["id"], "A1");
        assert_eq!(json["customerID"], "C1");
        assert!(json["paymentIDs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_decode_restores_payment() {
        let payment = Payment {
            payment_id: "P1".into(),
            sender_customer_id: "C1".into(),
            receiver_customer_id: "C2".into(),
            sender_account_id: "A1".into(),
            receiver_account_id: "A2".into(),
            amount: dec!(50),
            exchange_rate: dec!(0.9),
            date: "2024-01-01".into(),
        };
        let bytes = encode(&payment).unwrap();
        assert_eq!(decode::<Payment>("payment:P1", &bytes).unwrap(), payment);
    }

    #[test]
    fn test_decode_restores_bank_customer_and_account() {
        let bank = bank();
        assert_eq!(decode::<Bank>("bank:B1", &encode(&bank).unwrap()).unwrap(), bank);

        let customer = Customer {
            name: "Al".into(),
            surname: "Ice".into(),
            customer_id: "C1".into(),
            password: "pw".into(),
            account_ids: vec!["A1".into(), "A3".into()],
        };
        let bytes = encode(&customer).unwrap();
        assert_eq!(decode::<Customer>("customer:C1", &bytes).unwrap(), customer);

        let account = Account {
            account_id: "A1".into(),
            customer_id: "C1".into(),
            bank_id: "B1".into(),
            balance: dec!(-12.3400),
            currency: "USD".into(),
            payment_ids: vec!["P1".into(), "P2".into(), "P1".into()],
        };
        let decoded = decode::<Account>("account:A1", &encode(&account).unwrap()).unwrap();
        assert_eq!(decoded, account);
        // Scale survives the trip, not only the value
        assert_eq!(decoded.balance.to_string(), "-12.3400");
    }

    #[test]
    fn test_decode_accepts_missing_reference_lists() {
        let bytes = br#"{"name":"Al","surname":"Ice","customerID":"C1","password":"pw"}"#;
        let customer: Customer = decode("customer:C1", bytes).unwrap();
        assert!(customer.account_ids.is_empty());
    }

    #[test]
    fn test_decode_garbage_is_corrupt_record() {
        let err = decode::<Bank>("bank:B1", b"{not json").unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { ref key, .. } if key == "bank:B1"));
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id(Kind::Bank, "B1").is_ok());
        assert!(validate_id(Kind::Bank, "with:colon").is_ok());
        assert!(matches!(
            validate_id(Kind::Bank, ""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_id(Kind::Account, "A\u{0}1"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
