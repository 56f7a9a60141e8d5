//! Cross-currency payment settlement.
//!
//! A payment is settled as three record updates in a fixed order: the payment
//! record itself, the sender leg, then the receiver leg. Each leg moves the
//! account balance and the owning bank's reserves by the same converted delta,
//! so reserves always equal the net payment flow through the bank.
//!
//! Nothing here rolls back. Callers run [`settle`] inside a
//! [`crate::stores::UnitOfWork`] when a failed leg must leave no trace.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::codec::{self, Kind};
use crate::entities::{Account, Payment};
use crate::repository::EntityStore;
use crate::stores::RecordStore;
use crate::{Error, Result};

/// A request to move `amount` (sender currency) between two accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    pub payment_id: String,
    pub sender_account_id: String,
    pub receiver_account_id: String,
    pub sender_customer_id: String,
    pub receiver_customer_id: String,
    pub amount: Decimal,
    /// Receiver units per sender unit.
    pub exchange_rate: Decimal,
    pub date: String,
}

impl PaymentOrder {
    fn validate(&self) -> Result<()> {
        codec::validate_id(Kind::Payment, &self.payment_id)?;
        codec::validate_id(Kind::Account, &self.sender_account_id)?;
        codec::validate_id(Kind::Account, &self.receiver_account_id)?;
        if self.amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "exchange rate must be positive, got {}",
                self.exchange_rate
            )));
        }
        if self.sender_account_id == self.receiver_account_id {
            return Err(Error::InvalidArgument(format!(
                "account {} cannot pay itself",
                self.sender_account_id
            )));
        }
        Ok(())
    }

    fn into_payment(self) -> Payment {
        Payment {
            payment_id: self.payment_id,
            sender_customer_id: self.sender_customer_id,
            receiver_customer_id: self.receiver_customer_id,
            sender_account_id: self.sender_account_id,
            receiver_account_id: self.receiver_account_id,
            amount: self.amount,
            exchange_rate: self.exchange_rate,
            date: self.date,
        }
    }
}

/// Persists the payment, debits the sender, then credits the receiver.
pub fn settle<S: RecordStore + ?Sized>(store: &mut S, order: PaymentOrder) -> Result<Payment> {
    order.validate()?;
    let payment = order.into_payment();
    store.insert(&payment)?;

    // The sender side is never converted
    apply_leg(
        store,
        &payment.sender_account_id,
        &payment.sender_customer_id,
        -payment.amount,
        Decimal::ONE,
        &payment.payment_id,
    )?;
    apply_leg(
        store,
        &payment.receiver_account_id,
        &payment.receiver_customer_id,
        payment.amount,
        payment.exchange_rate,
        &payment.payment_id,
    )?;
    Ok(payment)
}

fn apply_leg<S: RecordStore + ?Sized>(
    store: &mut S,
    account_id: &str,
    customer_id: &str,
    amount: Decimal,
    rate: Decimal,
    payment_id: &str,
) -> Result<Account> {
    let mut account = store.fetch::<Account>(account_id)?;
    if account.customer_id != customer_id {
        return Err(Error::InvalidArgument(format!(
            "account {} belongs to customer {}, not {}",
            account_id, account.customer_id, customer_id
        )));
    }

    let converted = amount
        .checked_mul(rate)
        .ok_or_else(|| Error::overflow(format!("payment {payment_id} at rate {rate}")))?;
    account.balance = account
        .balance
        .checked_add(converted)
        .ok_or_else(|| Error::overflow(format!("balance of account {account_id}")))?;
    account.payment_ids.push(payment_id.to_owned());
    store.update_bank_reserves(&account.bank_id, converted)?;
    store.save(&account)?;
    debug!(
        account = %account_id,
        bank = %account.bank_id,
        delta = %converted,
        balance = %account.balance,
        "settled payment leg"
    );
    Ok(account)
}

/// Exchange rates quoted against one base currency, as published by rate feeds:
/// `{"base": "USD", "rates": {"EUR": 0.9, "TRY": 32.1}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| Error::InvalidArgument(format!("unreadable rate table: {err}")))
    }

    /// Units of `currency` per unit of the base currency.
    fn per_base(&self, currency: &str) -> Result<Decimal> {
        if currency == self.base {
            return Ok(Decimal::ONE);
        }
        match self.rates.get(currency) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            Some(rate) => Err(Error::InvalidArgument(format!(
                "non-positive rate {rate} for {currency}"
            ))),
            None => Err(Error::InvalidArgument(format!(
                "no exchange rate for {currency}"
            ))),
        }
    }

    /// Units of `to` per unit of `from`, crossing through the base currency.
    pub fn rate(&self, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.per_base(to)?
            .checked_div(self.per_base(from)?)
            .ok_or_else(|| Error::overflow(format!("rate from {from} to {to}")))
    }
}
