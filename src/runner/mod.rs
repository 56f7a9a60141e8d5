//! The runner is responsible for setting up a file stream for reading a journal
//! CSV, replaying its operations against an in-memory ledger, and writing the
//! resulting ledger snapshot to a writer.
//!
//! This module provides both a synchronous and an asynchronous runner implementations.
//!
mod async_runner;
mod sync_runner;

pub use async_runner::run as run_async;
pub use sync_runner::run;

use tracing::warn;

use crate::dto::{Command, JournalEntry, LedgerRow};
use crate::settlement::RateTable;
use crate::{Engine, Error, Result};

/// Parses and applies one journal row. Failures are logged and skipped, so a
/// bad row never stops the replay.
pub(crate) fn replay_entry(
    engine: &mut Engine,
    line: u64,
    entry: JournalEntry,
    rates: Option<&RateTable>,
) {
    let result = Command::try_from(entry).and_then(|command| apply(engine, command, rates));
    if let Err(err) = result {
        warn!(line, error = %err, "skipping journal entry");
    }
}

fn apply(engine: &mut Engine, command: Command, rates: Option<&RateTable>) -> Result<()> {
    match command {
        Command::CreateBank(new) => engine.create_bank(new).map(drop),
        Command::CreateCustomer {
            customer_id,
            password,
            name,
            surname,
        } => engine
            .create_customer(&customer_id, &password, &name, &surname)
            .map(drop),
        Command::CreateAccount {
            account_id,
            customer_id,
            bank_id,
            balance,
        } => engine
            .create_account(&account_id, &customer_id, &bank_id, balance)
            .map(drop),
        Command::CreatePayment {
            mut order,
            exchange_rate,
        } => {
            order.exchange_rate = match (exchange_rate, rates) {
                (Some(rate), _) => rate,
                (None, Some(rates)) => engine.quote(
                    &order.sender_account_id,
                    &order.receiver_account_id,
                    rates,
                )?,
                (None, None) => {
                    return Err(Error::InvalidArgument(format!(
                        "payment {} has no rate and no rate table was given",
                        order.payment_id
                    )))
                }
            };
            engine.create_payment(order).map(drop)
        }
        Command::UpdateProfile {
            customer_id,
            name,
            surname,
            password,
        } => engine
            .update_profile(&customer_id, &name, &surname, &password)
            .map(drop),
        Command::UpdateBankProfile { bank_id, profile } => {
            engine.update_bank_profile(&bank_id, &profile).map(drop)
        }
        Command::UpdateBalance { account_id, delta } => {
            engine.update_balance(&account_id, delta).map(drop)
        }
        Command::DeleteAccount { account_id } => engine.delete_account(&account_id).map(drop),
    }
}

/// Banks with their reserves, then accounts with their balances, each ordered by ID.
pub(crate) fn snapshot(engine: &Engine) -> Result<Vec<LedgerRow>> {
    let banks = engine.banks()?.into_iter().map(LedgerRow::from);
    let accounts = engine.accounts()?.into_iter().map(LedgerRow::from);
    Ok(banks.chain(accounts).collect())
}
