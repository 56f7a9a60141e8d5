//! The four record kinds of the ledger graph.
//!
//! Serde field names follow the persisted wire format, so records written by
//! earlier deployments keep decoding. Relationships are plain ID strings:
//! foreign keys on the child side, back-reference lists on the parent side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codec::{Entity, Kind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    #[serde(rename = "bankID")]
    pub bank_id: String,
    #[serde(rename = "bankAdminID")]
    pub bank_admin_id: String,
    /// Opaque credential, stored but never checked.
    pub password: String,
    pub country: String,
    pub currency: String,
    /// Net payment flow through this bank's accounts.
    pub reserves: Decimal,
    /// Accounts held at this bank, in creation order.
    #[serde(rename = "accountIDs", default)]
    pub account_ids: Vec<String>,
    #[serde(rename = "exchangeRate")]
    pub exchange_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub surname: String,
    #[serde(rename = "customerID")]
    pub customer_id: String,
    /// Opaque credential, stored but never checked.
    pub password: String,
    #[serde(rename = "accountIDs", default)]
    pub account_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "id")]
    pub account_id: String,
    #[serde(rename = "customerID")]
    pub customer_id: String,
    #[serde(rename = "bankID")]
    pub bank_id: String,
    /// Denominated in `currency`.
    pub balance: Decimal,
    /// Copied from the owning bank at creation and never changed.
    pub currency: String,
    /// Every payment that touched this account, on either side.
    #[serde(rename = "paymentIDs", default)]
    pub payment_ids: Vec<String>,
}

/// Immutable once written. `amount` is in the sender's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    #[serde(rename = "senderCustomerID")]
    pub sender_customer_id: String,
    #[serde(rename = "receiverCustomerID")]
    pub receiver_customer_id: String,
    #[serde(rename = "senderAccountID")]
    pub sender_account_id: String,
    #[serde(rename = "receiverAccountID")]
    pub receiver_account_id: String,
    pub amount: Decimal,
    /// Receiver units per sender unit.
    #[serde(rename = "exchangeRate")]
    pub exchange_rate: Decimal,
    /// Caller-supplied, not parsed.
    pub date: String,
}

impl Payment {
    /// The amount credited to the receiving account.
    pub fn converted_amount(&self) -> Decimal {
        self.amount * self.exchange_rate
    }
}

impl Entity for Bank {
    const KIND: Kind = Kind::Bank;

    fn id(&self) -> &str {
        &self.bank_id
    }
}

impl Entity for Customer {
    const KIND: Kind = Kind::Customer;

    fn id(&self) -> &str {
        &self.customer_id
    }
}

impl Entity for Account {
    const KIND: Kind = Kind::Account;

    fn id(&self) -> &str {
        &self.account_id
    }
}

impl Entity for Payment {
    const KIND: Kind = Kind::Payment;

    fn id(&self) -> &str {
        &self.payment_id
    }
}
