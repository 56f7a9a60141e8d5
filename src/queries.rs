//! Read-only projections over the ledger graph.
//!
//! Collections are resolved through back-reference lists in stored order.
//! A list entry that no longer resolves is reported as `NotFound`; it means
//! the graph is inconsistent, not that the result is merely shorter.

use std::collections::HashSet;

use crate::entities::{Account, Bank, Customer, Payment};
use crate::index;
use crate::repository::EntityStore;
use crate::stores::RecordStore;
use crate::Result;

fn resolve_all<E, S>(store: &S, ids: &[String]) -> Result<Vec<E>>
where
    E: crate::codec::Entity,
    S: RecordStore + ?Sized,
{
    ids.iter().map(|id| store.fetch::<E>(id)).collect()
}

/// Every payment that touched the account, oldest first.
pub fn payments<S: RecordStore + ?Sized>(store: &S, account_id: &str) -> Result<Vec<Payment>> {
    let account = store.fetch::<Account>(account_id)?;
    resolve_all(store, &account.payment_ids)
}

pub fn customer_accounts<S: RecordStore + ?Sized>(
    store: &S,
    customer_id: &str,
) -> Result<Vec<Account>> {
    let customer = store.fetch::<Customer>(customer_id)?;
    resolve_all(store, &customer.account_ids)
}

pub fn bank_accounts<S: RecordStore + ?Sized>(store: &S, bank_id: &str) -> Result<Vec<Account>> {
    let bank = store.fetch::<Bank>(bank_id)?;
    resolve_all(store, &bank.account_ids)
}

/// Distinct customers holding at least one account at the bank, found through
/// the composite index and ordered by their first account ID.
pub fn customers_by_bank<S: RecordStore + ?Sized>(
    store: &S,
    bank_id: &str,
) -> Result<Vec<Customer>> {
    store.fetch::<Bank>(bank_id)?;
    let mut seen = HashSet::new();
    index::scan_account_entries(store, Some(bank_id))?
        .into_iter()
        .filter(|entry| seen.insert(entry.customer_id.clone()))
        .map(|entry| store.fetch::<Customer>(&entry.customer_id))
        .collect()
}

pub fn customer_password<S: RecordStore + ?Sized>(store: &S, customer_id: &str) -> Result<String> {
    Ok(store.fetch::<Customer>(customer_id)?.password)
}
